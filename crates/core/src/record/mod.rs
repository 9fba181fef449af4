pub mod decode;
pub mod id;
pub mod model;
pub mod validate;

pub use id::RecordId;
pub use model::{
    Category, ContentType, Details, GiftDetails, NewsDetails, ProductDetails, Record,
    ReviewDetails,
};
pub use validate::ValidationError;
