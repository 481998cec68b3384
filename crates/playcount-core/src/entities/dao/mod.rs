pub mod beatmap;
pub mod following;
pub mod mapset;
pub mod track;
pub mod user;

pub use beatmap::Beatmap;
pub use following::Following;
pub use mapset::Mapset;
pub use track::TrackRun;
pub use user::User;
