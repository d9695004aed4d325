/// Admin account management
pub mod admin_user;

/// Admission periods and the registration window
pub mod admission;

/// Sign-in, sessions, and role permissions
pub mod auth;

/// Contact entries
pub mod contact;

/// Back-office dashboard figures
pub mod dashboard;

/// CSV export of registrations
pub mod export;

/// Declarative form schemas
pub mod form;

/// Gallery items
pub mod gallery;

/// News articles
pub mod news;

/// School profile
pub mod profile;

/// Applicant registrations and their documents
pub mod registration;

/// Vocational programs
pub mod skill;

/// URL slugs
pub mod slug;

/// Search, sort, and pagination for list screens
pub mod table;

/// Shared input validators
pub mod validation;
