pub mod participants;
pub mod team_registrations;

pub use participants::Participant;
pub use team_registrations::TeamRegistrationRow;
