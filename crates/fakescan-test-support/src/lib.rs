//! Test support utilities for fakescan.
//!
//! Scripted face locators and classifiers, synthetic video sources, a
//! recording sink and builders for services wired from them.
//!
//! # Example
//!
//! ```
//! use fakescan_test_support::{face, mock_service, MockVideoBackend, ScriptedClassifier, ScriptedLocator};
//!
//! let service = mock_service(
//!     ScriptedLocator::always(vec![face(10.0, 10.0, 60.0, 60.0)]),
//!     ScriptedClassifier::constant(0.8),
//!     MockVideoBackend::new(10, 64, 64),
//! );
//! let analysis = service.predict_image(&fakescan_test_support::solid_image(100, 100)).unwrap();
//! assert_eq!(analysis.classification.verdict().as_str(), "REAL");
//! ```

mod builders;
mod mocks;

pub use builders::{face, mock_service, mock_service_with, png_bytes, solid_image};
pub use mocks::{
    LocatorStep, MockVideoBackend, RecordingSink, ScriptedClassifier, ScriptedLocator, SinkRecord,
    SyntheticFrameSource,
};
