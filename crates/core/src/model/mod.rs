mod ids;
mod payload;
mod progress;
mod record;

pub use ids::{
    ADDRESS_HEX_LEN, CourseId, IdError, MAX_COURSE_ID_LEN, SessionId, StudentAddress,
};
pub use payload::{
    MAX_PAYLOAD_ENTRIES, MAX_PAYLOAD_KEY_LEN, MAX_PAYLOAD_TEXT_LEN, PayloadError, PayloadValue,
    SessionPayload,
};
pub use progress::{ProgressError, ProgressSummary};
pub use record::{SessionDraft, SessionRecord};
