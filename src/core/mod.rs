pub mod error;
pub mod request;
pub mod session;

pub use error::FluxError;
pub use request::{GenerationRequest, ModelVariant, ReferenceImage};
pub use session::{
    DragState, GenerateBackend, ImageOrigin, ImageRef, Session, SessionEvent, SessionStatus,
};
