//! Ad field validation applied before any pricing or persistence.

use crate::domain::error::DomainError;

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 5_000;
pub const SERVICES_MAX: usize = 20;
pub const SERVICE_MAX_CHARS: usize = 80;
pub const MEDIA_MAX: usize = 12;

/// Incoming ad fields as supplied by the caller, prior to validation.
#[derive(Debug, Clone)]
pub struct AdDraft {
    pub title: String,
    pub description: String,
    pub tarif: String,
    pub lieu: String,
    pub services: Vec<String>,
    pub disponibilite: String,
    pub media: Option<Vec<MediaDraft>>,
}

#[derive(Debug, Clone)]
pub struct MediaDraft {
    pub url: String,
    pub position: i32,
}

impl AdDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        let title_len = self.title.trim().chars().count();
        if title_len < TITLE_MIN_CHARS {
            return Err(DomainError::validation(format!(
                "title must be at least {TITLE_MIN_CHARS} characters"
            )));
        }
        if title_len > TITLE_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "title must be at most {TITLE_MAX_CHARS} characters"
            )));
        }

        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "description must be at most {DESCRIPTION_MAX_CHARS} characters"
            )));
        }

        if self.services.len() > SERVICES_MAX {
            return Err(DomainError::validation(format!(
                "at most {SERVICES_MAX} services may be listed"
            )));
        }
        for service in &self.services {
            if service.trim().is_empty() {
                return Err(DomainError::validation("services must not be blank"));
            }
            if service.chars().count() > SERVICE_MAX_CHARS {
                return Err(DomainError::validation(format!(
                    "each service must be at most {SERVICE_MAX_CHARS} characters"
                )));
            }
        }

        if let Some(media) = &self.media {
            if media.len() > MEDIA_MAX {
                return Err(DomainError::validation(format!(
                    "at most {MEDIA_MAX} media items may be attached"
                )));
            }
            for item in media {
                if item.url.trim().is_empty() {
                    return Err(DomainError::validation("media url must not be blank"));
                }
            }
        }

        Ok(())
    }
}
