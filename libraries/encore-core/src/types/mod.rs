mod album;
mod artist;
mod concert;
mod track;

pub use album::{Album, AlbumId, CreateAlbum};
pub use artist::{Artist, ArtistId, CreateArtist, SocialMediaLinks};
pub use concert::{
    normalize_start_time, Concert, ConcertArtist, ConcertArtistRole, ConcertId, CreateConcert,
    LineupEntry,
};
pub use track::{CreateTrack, Track, TrackId};
