//! Object storage naming for tree photos.
//!
//! Photos live in the assets bucket under [`TREE_IMAGE_PREFIX`]; the export
//! refers to the mirrored copy in the contents bucket under
//! [`EXPORT_PREFIX`]. Stored keys never include either prefix.

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Prefix of tree photos inside the assets bucket.
pub const TREE_IMAGE_PREFIX: &str = "trees";

/// Prefix of tree photos inside the contents bucket.
pub const EXPORT_PREFIX: &str = "sakura_camera/media/trees";

/// Region of the public asset URLs.
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Default contents bucket used in export paths.
pub const DEFAULT_CONTENTS_BUCKET: &str = "hrkz-prd-s3-contents";

/// Default lifetime of presigned URLs (seconds).
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Full object key of a stored photo key inside the assets bucket.
pub fn tree_object_key(image_obj_key: &str) -> String {
    format!("{TREE_IMAGE_PREFIX}/{image_obj_key}")
}

/// Public HTTPS URL of a photo. An empty key yields an empty URL.
pub fn public_image_url(bucket: &str, region: &str, image_obj_key: &str) -> String {
    if image_obj_key.is_empty() {
        return String::new();
    }
    format!(
        "https://{bucket}.s3.{region}.amazonaws.com/{}",
        tree_object_key(image_obj_key)
    )
}

/// `s3://` URI of a photo in the contents bucket.
pub fn export_s3_path(bucket: &str, image_obj_key: &str) -> String {
    format!("s3://{bucket}/{EXPORT_PREFIX}/{image_obj_key}")
}

/// Last path segment of an object key.
pub fn file_name(image_obj_key: &str) -> &str {
    image_obj_key
        .rsplit_once('/')
        .map(|(_, name)| name)
        .unwrap_or(image_obj_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_includes_prefix_and_region() {
        assert_eq!(
            public_image_url("assets", DEFAULT_REGION, "2024/04/01/a.jpg"),
            "https://assets.s3.ap-northeast-1.amazonaws.com/trees/2024/04/01/a.jpg"
        );
    }

    #[test]
    fn empty_key_gives_empty_url() {
        assert_eq!(public_image_url("assets", DEFAULT_REGION, ""), "");
    }

    #[test]
    fn export_path_and_file_name() {
        assert_eq!(
            export_s3_path("contents", "2024/04/01/a.jpg"),
            "s3://contents/sakura_camera/media/trees/2024/04/01/a.jpg"
        );
        assert_eq!(file_name("2024/04/01/a.jpg"), "a.jpg");
        assert_eq!(file_name("plain.jpg"), "plain.jpg");
    }
}
