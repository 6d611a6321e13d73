//! Identity and object naming for uploaded assets.

use crate::models::asset::AssetNames;
use uuid::Uuid;

const THUMBNAIL_SUFFIX: &str = "-thumbnail";

/// Return the text after the last `.` in `filename`, or `""` if there is none.
pub fn extension_of(filename: &str) -> &str {
    filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}

/// Generate a fresh identity and derive both object names from it.
///
/// The identity is a random v4 UUID; collisions are not checked for.
pub fn derive_names(original_filename: &str) -> AssetNames {
    names_for(Uuid::new_v4(), original_filename)
}

/// Derive object names for a known identity.
pub fn names_for(identity: Uuid, original_filename: &str) -> AssetNames {
    let extension = extension_of(original_filename);
    let primary = format!("{}.{}", identity, extension);
    let thumbnail = format!("{}{}.{}", identity, THUMBNAIL_SUFFIX, extension);

    AssetNames {
        identity,
        primary,
        thumbnail,
    }
}
