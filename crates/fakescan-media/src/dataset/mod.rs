//! Dataset preparation: face cropping, video face extraction, splitting,
//! class balancing, deduplication and batch job manifests.

pub mod batch;
pub mod dedup;
pub mod faces;
pub mod jobs;
pub mod scan;
pub mod split;
pub mod video_faces;

pub use batch::{default_worker_count, BatchOptions, BatchReport, ItemCallback, ItemError, ItemOutcome};
pub use dedup::{dedup_dir, fingerprint_file, image_fingerprint, DedupReport, HashStore};
pub use faces::{crop_faces_in_dir, primary_face_crop};
pub use jobs::{run_crop_jobs, CropJob, JobManifest, JobReport};
pub use scan::{collect_images, media_kind, scan_media, MediaKind};
pub use split::{
    apply_split, balance_and_split, dataset_rng, materialize_balanced, split_by_ratio, split_files,
    BalancedDataset, SplitPlan, TransferMode,
};
pub use video_faces::{extract_faces_from_video, extract_faces_from_videos, DEFAULT_MAX_FACES_PER_VIDEO};
