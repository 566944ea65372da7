use crate::constants::{PLACEHOLDER_IMAGES, SYNONYMS};
use crate::utils::text::{canonical, slug};

/// Sniff the mime type from magic bytes. Uploads that match none of the
/// supported container formats are rejected upstream with a 400.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]) {
        return Some("image/png");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    None
}

/// Stable stock photo for a breed: exact canonical match first, then
/// substring containment either way.
pub fn placeholder_for(pet_name: &str) -> Option<&'static str> {
    if pet_name.trim().is_empty() {
        return None;
    }
    let mut n = canonical(pet_name);
    if let Some(&(_, target)) = SYNONYMS.iter().find(|(from, _)| *from == n) {
        n = canonical(target);
    }
    if let Some(&(_, url)) = PLACEHOLDER_IMAGES.iter().find(|(name, _)| *name == n) {
        return Some(url);
    }
    PLACEHOLDER_IMAGES
        .iter()
        .find(|(name, _)| n.contains(name) || name.contains(n.as_str()))
        .map(|&(_, url)| url)
}

/// Deterministic seeded placeholder; distinct (name, idx) pairs give distinct
/// URLs, which is how result-image uniqueness is guaranteed.
pub fn seeded_fallback(pet_name: &str, idx: usize) -> String {
    format!("https://picsum.photos/seed/{}-{}/900/600", slug(pet_name), idx)
}
