pub mod appointment;
pub mod conversation;
pub mod enums;
pub mod patient;
pub mod user;

pub use appointment::Appointment;
pub use conversation::{AdviceRecord, Message};
pub use enums::{
    AppointmentStatus, ChatFlow, MessageRole, ParseEnumError, PatientStatus, SymptomCategory,
};
pub use patient::{Patient, Report};
pub use user::UserIdentity;
