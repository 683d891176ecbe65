// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Public URLs for media files stored next to the server.

/// Partner logos: `{server}/images/partners/{file}`
pub const PARTNER_IMAGES: &str = "images/partners";
/// Product setup videos: `{server}/videos/setup/{file}`
pub const SETUP_VIDEOS: &str = "videos/setup";
/// Product blueprints: `{server}/images/blueprints/{file}`
pub const BLUEPRINTS: &str = "images/blueprints";

/// Join a stored file name onto the public server URL.
pub fn media_url(server: &str, folder: &str, file: &str) -> String {
    format!("{}/{}/{}", server.trim_end_matches('/'), folder, file)
}

/// Rewrite `field` in place when it holds a non-empty file name.
pub fn rewrite_media_field(field: &mut Option<String>, server: &str, folder: &str) {
    if let Some(file) = field.as_deref().filter(|f| !f.is_empty()) {
        *field = Some(media_url(server, folder, file));
    }
}
