/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Maps a file path to the MIME type it is served with.
///
/// `None` means the type is unknown and the file must not be served.
pub trait ContentTypeClassifier: Send + Sync {
    fn classify(&self, path: &Path) -> Option<String>;
}

// Files which are source code for the server, never static content
const SERVER_SIDE_EXTENSIONS: [&str; 8] = [
    "php", "php5", "phtml", "phar", "inc", "py", "pl", "cgi",
];

/// Classify by file extension using mime_guess
#[derive(Clone, Copy, Debug, Default)]
pub struct MimeGuessClassifier;

impl ContentTypeClassifier for MimeGuessClassifier {
    fn classify(&self, path: &Path) -> Option<String> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if SERVER_SIDE_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }
        mime_guess::from_ext(&extension)
            .first_raw()
            .map(|mime| mime.to_string())
    }
}

// Extensions given "Access-Control-Allow-Origin: *" (images, stylesheets, scripts, fonts)
static WEB_ASSET: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // A literal pattern
    Regex::new(r"\.(gif|jpe?g|png|css|js|json|woff|woff2|svg|eot|ttf|ico)$").unwrap()
});

/// True for asset types that any origin may load
pub fn is_web_asset(path: &Path) -> bool {
    WEB_ASSET.is_match(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_static_assets() {
        let classifier = MimeGuessClassifier;
        assert_eq!(
            classifier.classify(Path::new("skins/common/main.css")).as_deref(),
            Some("text/css")
        );
        assert_eq!(
            classifier.classify(Path::new("resources/assets/poweredby.png")).as_deref(),
            Some("image/png")
        );
        assert!(classifier.classify(Path::new("resources/lib/jquery.js")).is_some());
    }

    #[test]
    fn unknown_for_missing_or_unsafe_extensions() {
        let classifier = MimeGuessClassifier;
        assert_eq!(classifier.classify(Path::new("skins/Vector")), None);
        assert_eq!(classifier.classify(Path::new("README")), None);
        assert_eq!(classifier.classify(Path::new("includes/WebStart.php")), None);
        assert_eq!(classifier.classify(Path::new("LocalSettings.PHP")), None);
        assert_eq!(classifier.classify(Path::new("file.notarealextension")), None);
    }

    #[test]
    fn web_assets_by_extension() {
        assert!(is_web_asset(Path::new("/srv/php-1.27/skins/a.css")));
        assert!(is_web_asset(Path::new("logo.jpeg")));
        assert!(is_web_asset(Path::new("font.woff2")));
        assert!(!is_web_asset(Path::new("page.html")));
        assert!(!is_web_asset(Path::new("a.css.map")));
    }
}
