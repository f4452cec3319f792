//! Command parsing, shared by the interactive session and the CLI

use std::path::PathBuf;

use crate::models::{ProductForm, ProductId};

/// A store command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the feed (liked first)
    Feed,
    /// Toggle a like
    Like(ProductId),
    /// Show one product
    Show(ProductId),
    /// Open a product's link in the browser
    Open(ProductId),
    /// List categories
    Categories,
    /// List brands in a category (default category when absent)
    Brands(Option<String>),
    /// List products, optionally filtered
    Products {
        /// Category filter
        category: Option<String>,
        /// Brand filter
        brand: Option<String>,
    },
    /// Reload from the backend
    Refresh,
    /// Upload a new listing
    Upload {
        /// Image file
        image: PathBuf,
        /// Text fields
        form: ProductForm,
    },
    /// Edit a listing; fields not given keep their current value
    Edit {
        /// Product to edit
        id: ProductId,
        /// `(field, value)` overrides
        fields: Vec<(String, String)>,
    },
    /// Show the signed-in user
    WhoAmI,
    /// Show help
    Help,
    /// Leave the session
    Quit,
}

impl Command {
    /// Whether the command works on the loaded product list
    ///
    /// Uploads, likes and account queries do not, so they still make sense
    /// when the initial load failed.
    pub const fn reads_snapshot(&self) -> bool {
        matches!(
            self,
            Self::Feed
                | Self::Show(_)
                | Self::Open(_)
                | Self::Categories
                | Self::Brands(_)
                | Self::Products { .. }
                | Self::Edit { .. }
        )
    }
}

/// Parse one input line; blank lines give `None`
pub fn parse(line: &str, default_category: &str) -> Result<Option<Command>, String> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    from_tokens(&tokens, default_category).map(Some)
}

/// Parse already split arguments (first token is the command name)
pub fn from_tokens(tokens: &[String], default_category: &str) -> Result<Command, String> {
    let Some((name, args)) = tokens.split_first() else {
        return Err("Missing command".to_string());
    };

    match name.to_lowercase().as_str() {
        "feed" | "f" => Ok(Command::Feed),
        "like" | "l" => Ok(Command::Like(id_arg(args, "like")?)),
        "show" | "s" => Ok(Command::Show(id_arg(args, "show")?)),
        "open" | "o" => Ok(Command::Open(id_arg(args, "open")?)),
        "categories" | "cats" => Ok(Command::Categories),
        "brands" => Ok(Command::Brands(args.first().cloned())),
        "products" | "ls" => Ok(Command::Products {
            category: args.first().cloned(),
            brand: args.get(1).cloned(),
        }),
        "refresh" | "r" => Ok(Command::Refresh),
        "upload" => {
            let (image, rest) = args
                .split_first()
                .ok_or("Missing image path\nExample: upload shoe.jpg title=\"Air Max\" brand=Nike")?;
            let mut form = ProductForm {
                category: default_category.to_string(),
                ..ProductForm::default()
            };
            for (field, value) in fields(rest)? {
                form.set(&field, &value).map_err(|e| e.to_string())?;
            }
            Ok(Command::Upload {
                image: PathBuf::from(image),
                form,
            })
        }
        "edit" => {
            let id = id_arg(args, "edit")?;
            let fields = fields(&args[1..])?;
            // Reject unknown field names up front
            let mut check = ProductForm::default();
            for (field, value) in &fields {
                check.set(field, value).map_err(|e| e.to_string())?;
            }
            Ok(Command::Edit { id, fields })
        }
        "whoami" => Ok(Command::WhoAmI),
        "help" | "?" | "h" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("Unknown command: {other}\nType 'help' for commands")),
    }
}

fn id_arg(args: &[String], command: &str) -> Result<ProductId, String> {
    args.first()
        .map(|id| ProductId::from(id.as_str()))
        .ok_or_else(|| format!("Missing product id\nExample: {command} 42"))
}

/// `key=value` and `--key value` pairs
fn fields(args: &[String]) -> Result<Vec<(String, String)>, String> {
    let mut out = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if let Some(key) = arg.strip_prefix("--") {
            let value = iter
                .next()
                .ok_or_else(|| format!("Missing value for --{key}"))?;
            out.push((key.to_string(), value.clone()));
        } else if let Some((key, value)) = arg.split_once('=') {
            out.push((key.to_string(), value.to_string()));
        } else {
            return Err(format!("Expected key=value, got: {arg}"));
        }
    }

    Ok(out)
}

/// Split on whitespace; single or double quotes group words
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut has_token = false;

    for c in line.chars() {
        match (c, quote) {
            ('"' | '\'', None) => {
                quote = Some(c);
                has_token = true;
            }
            (c, Some(open)) if c == open => quote = None,
            (c, None) if c.is_whitespace() => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            (c, _) => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err("Unterminated quote".to_string());
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(line: &str) -> Command {
        parse(line, "shoes").unwrap().unwrap()
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse("   ", "shoes").unwrap(), None);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_ok("feed"), Command::Feed);
        assert_eq!(parse_ok("like 42"), Command::Like(ProductId::from("42")));
        assert_eq!(parse_ok("brands"), Command::Brands(None));
        assert_eq!(parse_ok("Q"), Command::Quit);
    }

    #[test]
    fn test_quoted_filters() {
        assert_eq!(
            parse_ok(r#"products shoes "New Balance""#),
            Command::Products {
                category: Some("shoes".into()),
                brand: Some("New Balance".into()),
            }
        );
    }

    #[test]
    fn test_upload_fields() {
        let Command::Upload { image, form } =
            parse_ok(r#"upload ./pics/samba.jpg title="Samba OG" brand=Adidas --price "$100""#)
        else {
            panic!("expected upload");
        };
        assert_eq!(image, PathBuf::from("./pics/samba.jpg"));
        assert_eq!(form.title, "Samba OG");
        assert_eq!(form.brand, "Adidas");
        assert_eq!(form.price, "$100");
        assert_eq!(form.category, "shoes");
    }

    #[test]
    fn test_edit_fields() {
        assert_eq!(
            parse_ok("edit 7 price= url=https://example.com"),
            Command::Edit {
                id: ProductId::from("7"),
                fields: vec![
                    ("price".into(), String::new()),
                    ("url".into(), "https://example.com".into()),
                ],
            }
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse("like", "shoes").unwrap_err().contains("Missing product id"));
        assert!(parse("edit 7 colour=red", "shoes").unwrap_err().contains("Unknown field"));
        assert!(parse("upload a.jpg title", "shoes").unwrap_err().contains("key=value"));
        assert!(parse("dance", "shoes").unwrap_err().contains("Unknown command"));
        assert!(parse("show \"1", "shoes").is_err());
    }

    #[test]
    fn test_single_quotes() {
        assert_eq!(
            parse_ok("edit 42 --price '$90' title=\"Bob's Loafers\""),
            Command::Edit {
                id: ProductId::from("42"),
                fields: vec![
                    ("price".into(), "$90".into()),
                    ("title".into(), "Bob's Loafers".into()),
                ],
            }
        );
        assert!(parse("show '1", "shoes").unwrap_err().contains("Unterminated"));
    }

    #[test]
    fn test_snapshot_readers() {
        assert!(parse_ok("feed").reads_snapshot());
        assert!(parse_ok("edit 7 price=1").reads_snapshot());
        assert!(parse_ok("products shoes").reads_snapshot());
        assert!(!parse_ok("upload a.jpg title=a brand=b").reads_snapshot());
        assert!(!parse_ok("whoami").reads_snapshot());
        assert!(!parse_ok("like 3").reads_snapshot());
    }

    #[test]
    fn test_empty_quotes_are_a_token() {
        assert_eq!(
            parse_ok(r#"brands """#),
            Command::Brands(Some(String::new()))
        );
    }
}
