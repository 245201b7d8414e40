use super::domain::{
    AmlDeclarations, CaseSubmission, CompanyAddress, CompanyProfile, DirectorDeclaration,
    SettlementDetails, UboDeclaration,
};
use chrono::Utc;

/// Why a submission was refused. Validation runs before any write, so a
/// refused submission leaves no trace.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),
    #[error("contact email '{0}' is not a usable address")]
    InvalidContactEmail(String),
    #[error("ownership stake for UBO '{name}' must be between 0 and 100 percent, found {stake}")]
    UboStakeOutOfRange { name: String, stake: f32 },
    #[error("date of birth for UBO '{name}' is in the future")]
    UboBornInFuture { name: String },
}

/// Checks inbound submissions and produces the sanitized profile stored on
/// the case.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntakeValidator;

impl IntakeValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a submission and convert it into a stored profile. String
    /// fields are trimmed; the contact name is joined from its form parts.
    pub fn profile_from_submission(
        &self,
        submission: CaseSubmission,
    ) -> Result<CompanyProfile, ValidationError> {
        let company_name = clean(&submission.company_name);
        if company_name.is_empty() {
            return Err(ValidationError::MissingField("company_name"));
        }

        let registration_number = clean(&submission.registration_number);
        if registration_number.is_empty() {
            return Err(ValidationError::MissingField("registration_number"));
        }

        let entity_type = clean(&submission.entity_type);
        if entity_type.is_empty() {
            return Err(ValidationError::MissingField("entity_type"));
        }

        let country = clean(&submission.country);
        if country.is_empty() {
            return Err(ValidationError::MissingField("country"));
        }

        let contact_email = clean(&submission.contact_email);
        if !usable_email(&contact_email) {
            return Err(ValidationError::InvalidContactEmail(contact_email));
        }

        let contact_name = join_name(&submission.contact_first_name, &submission.contact_last_name);
        if contact_name.is_empty() {
            return Err(ValidationError::MissingField("contact_name"));
        }

        let today = Utc::now().date_naive();
        for ubo in &submission.ubos {
            let stake = ubo.ownership_percent;
            if !stake.is_finite() || !(0.0..=100.0).contains(&stake) {
                return Err(ValidationError::UboStakeOutOfRange {
                    name: clean(&ubo.full_name),
                    stake,
                });
            }
            if ubo.date_of_birth > today {
                return Err(ValidationError::UboBornInFuture {
                    name: clean(&ubo.full_name),
                });
            }
        }

        Ok(CompanyProfile {
            company_name,
            registration_number,
            entity_type,
            country,
            incorporation_date: submission.incorporation_date,
            website: submission.website.as_deref().map(clean).filter(|w| !w.is_empty()),
            contact_name,
            contact_email,
            address: sanitize_address(submission.address),
            directors: submission
                .directors
                .into_iter()
                .map(sanitize_director)
                .collect(),
            ubos: submission.ubos.into_iter().map(sanitize_ubo).collect(),
            declarations: sanitize_declarations(submission.declarations),
            banking: sanitize_banking(submission.banking),
        })
    }
}

fn clean(value: &str) -> String {
    value.trim().to_string()
}

fn join_name(first: &str, last: &str) -> String {
    let joined = format!("{} {}", first.trim(), last.trim());
    joined.trim().to_string()
}

/// Deliverability is the mail system's problem; intake only refuses
/// addresses that cannot possibly route.
fn usable_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
}

fn sanitize_address(address: CompanyAddress) -> CompanyAddress {
    CompanyAddress {
        street: clean(&address.street),
        city: clean(&address.city),
        state: address.state.as_deref().map(clean).filter(|s| !s.is_empty()),
        postal_code: clean(&address.postal_code),
    }
}

fn sanitize_director(director: DirectorDeclaration) -> DirectorDeclaration {
    DirectorDeclaration {
        full_name: clean(&director.full_name),
        role: clean(&director.role),
        nationality: clean(&director.nationality),
        residency_country: clean(&director.residency_country),
    }
}

fn sanitize_ubo(ubo: UboDeclaration) -> UboDeclaration {
    UboDeclaration {
        full_name: clean(&ubo.full_name),
        ownership_percent: ubo.ownership_percent,
        nationality: clean(&ubo.nationality),
        residency_country: clean(&ubo.residency_country),
        date_of_birth: ubo.date_of_birth,
        tax_id: ubo.tax_id.as_deref().map(clean).filter(|t| !t.is_empty()),
        pep: ubo.pep,
    }
}

fn sanitize_declarations(declarations: AmlDeclarations) -> AmlDeclarations {
    AmlDeclarations {
        sanctions_exposure: declarations.sanctions_exposure,
        source_of_funds: clean(&declarations.source_of_funds),
        source_of_wealth: clean(&declarations.source_of_wealth),
        expected_volume: clean(&declarations.expected_volume),
        aml_program_confirmed: declarations.aml_program_confirmed,
    }
}

fn sanitize_banking(banking: SettlementDetails) -> SettlementDetails {
    SettlementDetails {
        bank_name: clean(&banking.bank_name),
        routing_number: banking
            .routing_number
            .as_deref()
            .map(clean)
            .filter(|r| !r.is_empty()),
        account_number: banking
            .account_number
            .as_deref()
            .map(clean)
            .filter(|a| !a.is_empty()),
    }
}
