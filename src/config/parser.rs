use crate::config::validation::validate_target;
use crate::sites::Target;
use crate::ConfigError;
use std::path::Path;

/// Loads, parses and validates a custom target file
///
/// # Arguments
///
/// * `path` - Path to the TOML target file
///
/// # Returns
///
/// * `Ok(Target)` - Successfully loaded and validated target
/// * `Err(ConfigError)` - Failed to read, parse, or validate the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use listing_harvest::config::load_target;
///
/// let target = load_target(Path::new("targets/books.toml")).unwrap();
/// println!("{} site(s), key field {}", target.sites.len(), target.key_field());
/// ```
pub fn load_target(path: &Path) -> Result<Target, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_target(&content)
}

/// Parses and validates target TOML already held in memory
pub fn parse_target(content: &str) -> Result<Target, ConfigError> {
    let target: Target = toml::from_str(content)?;
    validate_target(&target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_target(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const BOOKS: &str = r#"
name = "Books"
slug = "books_{genre}"

[params]
genre = "travel"

[[site]]
name = "Books to Scrape"
search-url = "https://books.toscrape.com/catalogue/category/books/{genre|lower}/index.html"
container = ["article.product_pod"]
key-field = "link"
pagination = { next-link = { selectors = ["li.next a"] } }

[[site.field]]
name = "title"
selectors = ["h3 a"]
source = { attr = "title" }
missing = "drop"

[[site.field]]
name = "link"
selectors = ["h3 a"]
source = { attr = "href" }
normalize = ["absolute-url"]
missing = "drop"

[[site.field]]
name = "price"
selectors = ["p.price_color"]
missing = { sentinel = "unknown" }
"#;

    #[test]
    fn test_load_valid_target() {
        let file = create_temp_target(BOOKS);
        let target = load_target(file.path()).unwrap();

        assert_eq!(target.name, "Books");
        assert!(!target.concurrent);
        assert_eq!(target.params.get("genre").map(String::as_str), Some("travel"));
        assert_eq!(target.sites.len(), 1);
        assert_eq!(target.key_field(), "link");
        assert_eq!(target.columns(), vec!["title", "link", "price", "scraped_at"]);
    }

    #[test]
    fn test_bundled_books_target() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("targets/books.toml");
        let target = load_target(&path).unwrap();

        assert_eq!(target.slug, "books_{genre}");
        assert_eq!(target.columns().len(), 6);
    }

    #[test]
    fn test_load_target_with_invalid_path() {
        let result = load_target(Path::new("/nonexistent/target.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_target_with_invalid_toml() {
        let file = create_temp_target("this is not valid TOML {{{");
        let result = load_target(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_target_with_validation_error() {
        let content = BOOKS.replace("{genre|lower}", "{category}");
        let file = create_temp_target(&content);
        let result = load_target(file.path());
        assert!(matches!(result, Err(ConfigError::UnknownPlaceholder { .. })));
    }
}
