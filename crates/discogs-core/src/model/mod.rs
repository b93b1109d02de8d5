pub mod artist;
pub mod associations;
pub mod genre;
pub mod ids;
pub mod image;
pub mod label;
pub mod master;
pub mod release;
pub mod run;

pub use artist::Artist;
pub use associations::{MasterArtist, MasterGenre, ReleaseArtist, ReleaseGenre, ReleaseLabel};
pub use genre::Genre;
pub use ids::{ArtistId, GenreId, LabelId, MasterId, ReleaseId};
pub use image::{Image, ImageType, ImageableType};
pub use label::Label;
pub use master::Master;
pub use release::{Format, FormatDetail, Release, Track, Video};
pub use run::{ProcessingRun, RunStatus, Stage, Step, StepRecord};
