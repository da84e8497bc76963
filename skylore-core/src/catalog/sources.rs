///! Upstream sources and listing extraction
///!
///! Two constellation index sites publish differently structured listings:
///! the primary site links detail pages from a plain table of anchors, the
///! backup site wraps them in card markup. Each source gets its own
///! extraction routine; both return an empty list instead of failing so the
///! manager can treat "primary yielded nothing" as "consult the backup".

use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::types::slugify;

/// Hard cap on listing links consumed downstream. A complete modern
/// catalogue has 88 constellations; anything beyond that is page noise.
pub const MAX_LISTING_LINKS: usize = 88;

/// Which upstream a page came from. Listing markup and a few detail-page
/// patterns differ between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Primary,
    Backup,
}

impl CatalogSource {
    pub fn listing_url(self) -> &'static str {
        match self {
            CatalogSource::Primary => "https://www.go-astronomy.com/constellations.htm",
            CatalogSource::Backup => "https://www.constellation-guide.com/constellation-list/",
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            CatalogSource::Primary => "https://www.go-astronomy.com",
            CatalogSource::Backup => "https://www.constellation-guide.com",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CatalogSource::Primary => "primary",
            CatalogSource::Backup => "backup",
        }
    }
}

/// One `(name, detail URL)` pair discovered on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedConstellation {
    pub name: String,
    pub url: String,
}

/// Extract constellation links from a listing page body.
///
/// Order follows document order, duplicates (same slug) are dropped, and
/// the result is capped at [`MAX_LISTING_LINKS`].
pub fn extract_listing(body: &str, source: CatalogSource) -> Vec<ListedConstellation> {
    let raw = match source {
        CatalogSource::Primary => extract_primary(body),
        CatalogSource::Backup => extract_backup(body),
    };

    let mut seen = Vec::new();
    let mut links = Vec::new();
    for link in raw {
        let slug = slugify(&link.name);
        if slug.is_empty() || seen.contains(&slug) {
            continue;
        }
        seen.push(slug);
        links.push(link);
        if links.len() >= MAX_LISTING_LINKS {
            break;
        }
    }

    tracing::debug!(
        "Extracted {} constellation links from {} listing",
        links.len(),
        source.label()
    );
    links
}

/// Primary index: a table of anchors pointing at per-constellation pages
/// (`constellations.php?Name=...`).
fn extract_primary(body: &str) -> Vec<ListedConstellation> {
    let document = Html::parse_document(body);
    let selector = match Selector::parse(r#"a[href*="constellations.php?Name="]"#) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Invalid listing selector: {:?}", e);
            return Vec::new();
        }
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let name = element.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            continue;
        }
        links.push(ListedConstellation {
            name,
            url: resolve_url(CatalogSource::Primary.base_url(), href),
        });
    }
    links
}

static BACKUP_LINK_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r#"<a\s+[^>]*href="([^"]*?/constellation-list/[a-z0-9-]+-constellation/?)"[^>]*>([^<]+)</a>"#,
    )
    .expect("valid backup listing regex")
});

/// Backup index: card markup; anchors carry an absolute or site-relative
/// URL ending in `<slug>-constellation/` with the display name as text.
fn extract_backup(body: &str) -> Vec<ListedConstellation> {
    let mut links = Vec::new();
    for caps in BACKUP_LINK_RE.captures_iter(body) {
        let href = caps[1].to_string();
        let mut name = decode_entities(caps[2].trim());
        // The backup site titles pages "Orion Constellation"; keep the name.
        if let Some(stripped) = name.strip_suffix(" Constellation") {
            name = stripped.to_string();
        }
        if name.is_empty() {
            continue;
        }
        links.push(ListedConstellation {
            name,
            url: resolve_url(CatalogSource::Backup.base_url(), &href),
        });
    }
    links
}

/// Resolve a possibly-relative href against a source's site root.
pub fn resolve_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix('/') {
        format!("{}/{}", base.trim_end_matches('/'), rest)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    }
}

/// Decode the handful of HTML entities that show up in constellation names
/// and narrative text. Listing names come out of regex captures, so the
/// HTML parser has not already done this for us.
pub fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_primary_listing() {
        let body = r#"
            <html><body><table>
            <tr><td><a href="constellations.php?Name=Andromeda">Andromeda</a></td></tr>
            <tr><td><a href="constellations.php?Name=Ursa%20Major">Ursa Major</a></td></tr>
            <tr><td><a href="other.htm">Not a constellation</a></td></tr>
            </table></body></html>"#;
        let links = extract_listing(body, CatalogSource::Primary);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].name, "Andromeda");
        assert_eq!(
            links[0].url,
            "https://www.go-astronomy.com/constellations.php?Name=Andromeda"
        );
        assert_eq!(links[1].name, "Ursa Major");
    }

    #[test]
    fn test_extract_backup_listing() {
        let body = r#"
            <div class="entry">
            <a href="https://www.constellation-guide.com/constellation-list/orion-constellation/">Orion Constellation</a>
            <a href="/constellation-list/canis-major-constellation/" class="card">Canis Major Constellation</a>
            </div>"#;
        let links = extract_listing(body, CatalogSource::Backup);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].name, "Orion");
        assert_eq!(
            links[1].url,
            "https://www.constellation-guide.com/constellation-list/canis-major-constellation/"
        );
    }

    #[test]
    fn test_extract_listing_dedupes_and_preserves_order() {
        let body = r#"
            <a href="constellations.php?Name=Lyra">Lyra</a>
            <a href="constellations.php?Name=Cygnus">Cygnus</a>
            <a href="constellations.php?Name=Lyra">Lyra</a>"#;
        let links = extract_listing(body, CatalogSource::Primary);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].name, "Lyra");
        assert_eq!(links[1].name, "Cygnus");
    }

    #[test]
    fn test_extract_listing_caps_link_count() {
        let mut body = String::new();
        for i in 0..120 {
            body.push_str(&format!(
                r#"<a href="constellations.php?Name=Fake{i}">Fake {i}</a>"#
            ));
        }
        let links = extract_listing(&body, CatalogSource::Primary);
        assert_eq!(links.len(), MAX_LISTING_LINKS);
    }

    #[test]
    fn test_extract_listing_empty_on_no_match() {
        let links = extract_listing("<html><body>maintenance</body></html>", CatalogSource::Primary);
        assert!(links.is_empty());
        let links = extract_listing("<html><body>maintenance</body></html>", CatalogSource::Backup);
        assert!(links.is_empty());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Pisces &amp; Cetus"), "Pisces & Cetus");
        assert_eq!(decode_entities("Berenice&#39;s Hair"), "Berenice's Hair");
        assert_eq!(decode_entities("&quot;Crux&quot;"), "\"Crux\"");
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://a.example", "https://b.example/x"),
            "https://b.example/x"
        );
        assert_eq!(resolve_url("https://a.example", "/p/q"), "https://a.example/p/q");
        assert_eq!(resolve_url("https://a.example/", "p.htm"), "https://a.example/p.htm");
    }
}
