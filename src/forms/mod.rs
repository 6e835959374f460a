mod errors;
mod payload;
mod project;

pub use errors::FormErrors;
pub use payload::{parse_multipart, parse_urlencoded, FormPayload, UploadedFile};
pub use project::{
    CleanedProject, ImageChange, ProjectForm, CATEGORY_MAX_LENGTH, IMAGE_EXTENSIONS,
    TITLE_MAX_LENGTH,
};
