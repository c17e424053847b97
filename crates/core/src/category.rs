/// Site categories used to organise downloaded models, in priority order.
pub const CATEGORIES: [&str; 15] = [
    "character",
    "style",
    "celebrity",
    "concept",
    "clothing",
    "base model",
    "poses",
    "background",
    "tool",
    "buildings",
    "vehicle",
    "objects",
    "animal",
    "action",
    "asset",
];

/// Fallback when no tag names a known category.
pub const MISC: &str = "misc";

/// Guess a category from a model's tags.
///
/// Returns the first tag (original casing) that matches a category, so tag
/// order wins over the order of [`CATEGORIES`].
pub fn infer_category<I, S>(tags: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for tag in tags {
        let tag = tag.as_ref();
        let lower = tag.to_lowercase();
        if CATEGORIES.iter().any(|category| *category == lower) {
            return tag.to_string();
        }
    }
    MISC.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tag_position_wins() {
        assert_eq!(infer_category(["anime", "character", "style"]), "character");
        assert_eq!(infer_category(["style", "character"]), "style");
    }

    #[test]
    fn test_original_casing_is_kept() {
        assert_eq!(infer_category(["Base Model", "tool"]), "Base Model");
    }

    #[test]
    fn test_misc_fallback() {
        assert_eq!(infer_category(["anime", "sdxl"]), MISC);
        assert_eq!(infer_category(Vec::<String>::new()), MISC);
    }

    #[test]
    fn test_partial_matches_do_not_count() {
        assert_eq!(infer_category(["characters", "styles"]), MISC);
    }
}
