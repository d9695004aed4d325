//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod admin_user;
pub mod admission_period;
pub mod contact;
pub mod gallery;
pub mod news;
pub mod registration;
pub mod school_profile;
pub mod session;
pub mod skill;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

// Re-export specific types to avoid conflicts
pub use admin_user::{Entity as AdminUser, Model as AdminUserModel, Role};
pub use admission_period::{Entity as AdmissionPeriod, Model as AdmissionPeriodModel};
pub use contact::{ContactType, Entity as Contact, Model as ContactModel};
pub use gallery::{Entity as Gallery, GalleryCategory, MediaType, Model as GalleryModel};
pub use news::{Entity as News, Model as NewsModel, NewsCategory};
pub use registration::{
    Entity as Registration, Gender, Model as RegistrationModel, RegistrationDocuments,
    RegistrationStatus,
};
pub use school_profile::{Entity as SchoolProfile, Model as SchoolProfileModel};
pub use session::{Entity as Session, Model as SessionModel};
pub use skill::{Entity as Skill, Model as SkillModel};

/// A list of short strings stored as a JSON array column
/// (subjects, facilities, requirements, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    /// Trims every item and drops the empty ones.
    #[must_use]
    pub fn cleaned(items: Vec<String>) -> Self {
        Self(
            items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        )
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the list has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for StringList {
    fn from(items: Vec<String>) -> Self {
        Self::cleaned(items)
    }
}
