use std::path::Path;
use std::time::SystemTime;

use crate::models::Listing;
use crate::utils::error::LoadError;

/// Default maximum number of listings a watch-list may contain.
pub const DEFAULT_MAX_LISTINGS: usize = 10;

/// Reads the watch-list file and turns each non-blank line into a listing.
///
/// An empty file yields an empty list, not an error. A file with more than
/// `max_listings` entries fails as a whole with [`LoadError::TooManyListings`].
pub async fn load_watchlist(path: &Path, max_listings: usize) -> Result<Vec<Listing>, LoadError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    parse_watchlist(&contents, max_listings)
}

pub fn parse_watchlist(contents: &str, max_listings: usize) -> Result<Vec<Listing>, LoadError> {
    let listings: Vec<Listing> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Listing::new)
        .collect();

    if listings.len() > max_listings {
        return Err(LoadError::TooManyListings {
            count: listings.len(),
            max: max_listings,
        });
    }

    Ok(listings)
}

/// The version of a watch-list file as the filesystem reports it.
///
/// Two reads of an unchanged file yield equal stamps. The length is part of the
/// stamp because an edit landing within the filesystem's timestamp granularity
/// can keep the previous mtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    modified: SystemTime,
    len: u64,
}

/// Stats `path`. `None` means the metadata could not be read, which callers
/// treat as changed so that the subsequent read surfaces the real error.
pub async fn file_stamp(path: &Path) -> Option<FileStamp> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => match meta.modified() {
            Ok(modified) => Some(FileStamp {
                modified,
                len: meta.len(),
            }),
            Err(e) => {
                tracing::debug!("No modification time for {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            tracing::debug!("Unable to stat {}: {}", path.display(), e);
            None
        }
    }
}
