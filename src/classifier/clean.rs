use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("static normalizer pattern"));

/// Lower-cases `text`, drops everything outside `[a-z0-9\s]` and trims.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALNUM.replace_all(&lowered, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_allowed_chars(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
    }

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(clean_text("Hello, World! 123"), "hello world 123");
    }

    #[test]
    fn empty_and_blank_input() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \t\n "), "");
        assert_eq!(clean_text("?!..."), "");
    }

    #[test]
    fn drops_emoji_and_accents_keeps_inner_whitespace() {
        assert_eq!(clean_text("  I feel   SAD 😢 today\n"), "i feel   sad  today");
        assert_eq!(clean_text("Café naïve"), "caf nave");
    }

    #[test]
    fn output_alphabet_holds_for_varied_input() {
        let inputs = [
            "Hello, World! 123",
            "  ünïcödé ÄÖÜ ß ",
            "tabs\tand\nnewlines\r\n",
            "I can't sleep... (again) #3am",
            "ⅫⅬ ＦＵＬＬＷＩＤＴＨ",
            "😀😃😄",
            "--- MiXeD CaSe 42 ---",
        ];
        for input in inputs {
            let out = clean_text(input);
            assert!(only_allowed_chars(&out), "bad output {out:?} for {input:?}");
            assert_eq!(out, out.trim(), "untrimmed output for {input:?}");
        }
    }

    #[test]
    fn already_clean_text_is_unchanged() {
        let text = "i have been feeling anxious for 2 weeks";
        assert_eq!(clean_text(text), text);
    }
}
