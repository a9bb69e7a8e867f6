//! Season/episode extraction from free-text episode titles.
//!
//! iview exposes numbering only inside display strings such as
//! `"Series 3 Episode 4 The Long Road"`. Rules are tried in order and the
//! first match wins; when nothing matches the numbers default to 0 and the
//! caller-supplied fallback name is used.

use regex::Regex;

/// Numbers and name parsed from a display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub season: u32,
    pub number: u32,
    pub name: Option<String>,
    /// Name of the rule that matched, `"default"` when none did.
    pub rule: &'static str,
}

struct TitleRule {
    name: &'static str,
    regex: Regex,
    season_group: usize,
    number_group: Option<usize>,
    name_group: usize,
}

/// Ordered rule set.
pub struct TitleRules {
    rules: Vec<TitleRule>,
}

impl TitleRules {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = vec![
            // "Series 2 Episode 5 Name", name optional
            TitleRule {
                name: "series-episode",
                regex: Regex::new(r"Series (\d+) Episode (\d+)(?: (.+))?")?,
                season_group: 1,
                number_group: Some(2),
                name_group: 3,
            },
            // "Series 2 Name"
            TitleRule {
                name: "series-only",
                regex: Regex::new(r"Series (\d+) (.+)")?,
                season_group: 1,
                number_group: None,
                name_group: 2,
            },
        ];
        Ok(Self { rules })
    }

    /// Parse `title`, using `fallback_name` when no rule yields a name.
    pub fn parse(&self, title: &str, fallback_name: Option<&str>) -> ParsedTitle {
        for rule in &self.rules {
            let Some(caps) = rule.regex.captures(title) else {
                continue;
            };
            let number_at = |group: usize| {
                caps.get(group)
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .unwrap_or(0)
            };
            let name = caps
                .get(rule.name_group)
                .map(|m| m.as_str().trim().to_string())
                .filter(|n| !n.is_empty())
                .or_else(|| fallback_name.map(str::to_string));

            return ParsedTitle {
                season: number_at(rule.season_group),
                number: rule.number_group.map_or(0, number_at),
                name,
                rule: rule.name,
            };
        }

        ParsedTitle {
            season: 0,
            number: 0,
            name: fallback_name.map(str::to_string),
            rule: "default",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TitleRules {
        TitleRules::new().unwrap()
    }

    #[test]
    fn series_and_episode() {
        let parsed = rules().parse("Series 3 Episode 12 The Long Road", Some("alt"));
        assert_eq!(parsed.season, 3);
        assert_eq!(parsed.number, 12);
        assert_eq!(parsed.name.as_deref(), Some("The Long Road"));
        assert_eq!(parsed.rule, "series-episode");
    }

    #[test]
    fn series_and_episode_without_name_uses_fallback() {
        let parsed = rules().parse("Series 1 Episode 4", Some("Pilot"));
        assert_eq!((parsed.season, parsed.number), (1, 4));
        assert_eq!(parsed.name.as_deref(), Some("Pilot"));
    }

    #[test]
    fn series_only() {
        let parsed = rules().parse("Series 2 Christmas Special", Some("alt"));
        assert_eq!(parsed.season, 2);
        assert_eq!(parsed.number, 0);
        assert_eq!(parsed.name.as_deref(), Some("Christmas Special"));
        assert_eq!(parsed.rule, "series-only");
    }

    #[test]
    fn no_match_defaults() {
        for title in ["Behind the News", "Episode 5 Something", ""] {
            let parsed = rules().parse(title, Some("Subtitle"));
            assert_eq!((parsed.season, parsed.number), (0, 0), "{title}");
            assert_eq!(parsed.name.as_deref(), Some("Subtitle"));
            assert_eq!(parsed.rule, "default");
        }
    }

    #[test]
    fn no_match_without_fallback() {
        let parsed = rules().parse("Gardening Australia", None);
        assert_eq!(parsed.name, None);
    }
}
