pub mod codec;
pub mod density;
pub mod operations;
pub mod preprocess;
pub mod source;

pub use codec::{encode_png, to_data_url};
pub use density::DensityExtractor;
pub use preprocess::ImagePreprocessor;
pub use source::{EncodedImage, ImageFile, ImageSource, LoadImage, Preloaded, RawPixels};
