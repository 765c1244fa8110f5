//! Plain-text code mutations used by the imposter.
//!
//! Every strategy draws from the caller's random source, so a seeded generator reproduces the
//! exact same damage. Strategies that find nothing to break report `success = false` and hand
//! the source back untouched.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::sabotage::{SabotageOutcome, SabotageType};

const STATEMENT_TERMINATOR: char = ';';
const OPENING_BRACKETS: [char; 2] = ['(', '{'];

// 入れ替え候補（from, to）
const LOGIC_SWAPS: [(&str, &str); 8] = [
    ("true", "false"),
    ("false", "true"),
    (" + ", " - "),
    (" - ", " + "),
    (" < ", " > "),
    (" > ", " < "),
    ("++", "--"),
    ("--", "++"),
];

pub fn apply_sabotage<R: Rng + ?Sized>(
    kind: SabotageType,
    source: &str,
    rng: &mut R,
) -> SabotageOutcome {
    match kind {
        SabotageType::SyntaxError => apply_syntax_error(source, rng),
        SabotageType::LogicSwap => apply_logic_swap(source, rng),
        SabotageType::ClearLine => apply_clear_line(source, rng),
        SabotageType::PowerCut => environment_only(source, "The lights went out"),
        SabotageType::SealDoor => environment_only(source, "A door slammed shut"),
        SabotageType::LockTerminal => environment_only(source, "A terminal was locked"),
    }
}

fn environment_only(source: &str, description: &str) -> SabotageOutcome {
    SabotageOutcome {
        success: true,
        new_code: source.to_string(),
        description: description.to_string(),
    }
}

fn unchanged(source: &str, description: &str) -> SabotageOutcome {
    SabotageOutcome {
        success: false,
        new_code: source.to_string(),
        description: description.to_string(),
    }
}

fn non_blank_lines(lines: &[&str]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, _)| index)
        .collect()
}

/// Removes the first `;` of a random non-blank line, or leaves an unmatched bracket at its end.
pub fn apply_syntax_error<R: Rng + ?Sized>(source: &str, rng: &mut R) -> SabotageOutcome {
    let lines: Vec<&str> = source.split('\n').collect();
    let candidates = non_blank_lines(&lines);
    let Some(&target) = candidates.choose(rng) else {
        return unchanged(source, "Nothing to break");
    };

    let line = lines[target];
    let (broken, description) = match line.find(STATEMENT_TERMINATOR) {
        Some(pos) => {
            let mut broken = line.to_string();
            broken.remove(pos);
            (broken, format!("Removed a semicolon on line {}", target + 1))
        }
        None => {
            let bracket = OPENING_BRACKETS[rng.gen_range(0..OPENING_BRACKETS.len())];
            // CRLF の場合は改行コードの前に差し込む
            let (body, cr) = match line.strip_suffix('\r') {
                Some(body) => (body, "\r"),
                None => (line, ""),
            };
            (
                format!("{}{}{}", body, bracket, cr),
                format!("Left an unmatched '{}' on line {}", bracket, target + 1),
            )
        }
    };

    let mut rewritten: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    rewritten[target] = broken;

    SabotageOutcome {
        success: true,
        new_code: rewritten.join("\n"),
        description,
    }
}

/// Flips the first occurrence of the first swappable token, trying the pairs in a random order.
pub fn apply_logic_swap<R: Rng + ?Sized>(source: &str, rng: &mut R) -> SabotageOutcome {
    let mut order: Vec<usize> = (0..LOGIC_SWAPS.len()).collect();
    order.shuffle(rng);

    for index in order {
        let (from, to) = LOGIC_SWAPS[index];
        if source.contains(from) {
            return SabotageOutcome {
                success: true,
                new_code: source.replacen(from, to, 1),
                description: format!("Swapped '{}' for '{}'", from.trim(), to.trim()),
            };
        }
    }

    unchanged(source, "No logic to swap")
}

/// Deletes a random non-blank line outright.
pub fn apply_clear_line<R: Rng + ?Sized>(source: &str, rng: &mut R) -> SabotageOutcome {
    let lines: Vec<&str> = source.split('\n').collect();
    let candidates = non_blank_lines(&lines);
    let Some(&target) = candidates.choose(rng) else {
        return unchanged(source, "Nothing to delete");
    };

    let remaining: Vec<&str> = lines
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != target)
        .map(|(_, line)| *line)
        .collect();

    SabotageOutcome {
        success: true,
        new_code: remaining.join("\n"),
        description: format!("Deleted line {}", target + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(2024)
    }

    #[test]
    fn blank_input_is_left_alone() {
        let blank = "\n   \n\t\n";
        let syntax = apply_syntax_error(blank, &mut rng());
        assert!(!syntax.success);
        assert_eq!(syntax.new_code, blank);

        let cleared = apply_clear_line(blank, &mut rng());
        assert!(!cleared.success);
        assert_eq!(cleared.new_code, blank);

        assert!(!apply_syntax_error("", &mut rng()).success);
    }

    #[test]
    fn syntax_error_drops_the_first_semicolon() {
        let outcome = apply_syntax_error("int x = 1; int y = 2;", &mut rng());
        assert!(outcome.success);
        assert_eq!(outcome.new_code, "int x = 1 int y = 2;");
    }

    #[test]
    fn syntax_error_without_terminator_adds_a_bracket() {
        let outcome = apply_syntax_error("print('hi')", &mut rng());
        assert!(outcome.success);
        let added = outcome.new_code.strip_prefix("print('hi')").unwrap();
        assert!(added == "(" || added == "{");
    }

    #[test]
    fn syntax_error_only_touches_non_blank_lines() {
        let source = "\nlet a = 1;\n\n";
        let outcome = apply_syntax_error(source, &mut rng());
        assert_eq!(outcome.new_code, "\nlet a = 1\n\n");
    }

    #[test]
    fn syntax_error_keeps_crlf_endings() {
        let outcome = apply_syntax_error("print(1)\r\n", &mut rng());
        assert!(outcome.new_code == "print(1)(\r\n" || outcome.new_code == "print(1){\r\n");
    }

    #[test]
    fn logic_swap_replaces_only_first_occurrence() {
        let outcome = apply_logic_swap("a = true\nb = true", &mut rng());
        assert!(outcome.success);
        assert_eq!(outcome.new_code, "a = false\nb = true");
    }

    #[test]
    fn logic_swap_picks_one_of_the_present_tokens() {
        let source = "if (i < n) { i++; }";
        let outcome = apply_logic_swap(source, &mut rng());
        assert!(outcome.success);
        assert!(
            outcome.new_code == "if (i > n) { i++; }" || outcome.new_code == "if (i < n) { i--; }"
        );
    }

    #[test]
    fn logic_swap_without_tokens_fails() {
        let outcome = apply_logic_swap("print(x*y)", &mut rng());
        assert!(!outcome.success);
        assert_eq!(outcome.new_code, "print(x*y)");
    }

    #[test]
    fn clear_line_removes_one_line() {
        let source = "a\n\nb\nc";
        let outcome = apply_clear_line(source, &mut rng());
        assert!(outcome.success);
        let lines: Vec<&str> = outcome.new_code.split('\n').collect();
        assert_eq!(lines.len(), 3);
        let removed: Vec<&str> = ["a", "b", "c"]
            .into_iter()
            .filter(|l| !lines.contains(l))
            .collect();
        assert_eq!(removed.len(), 1);
        assert!(lines.contains(&""));
    }

    #[test]
    fn same_seed_same_damage() {
        let source = "x = 1;\ny = 2;\nz = 3;";
        let first = apply_sabotage(SabotageType::ClearLine, source, &mut rng());
        let second = apply_sabotage(SabotageType::ClearLine, source, &mut rng());
        assert_eq!(first, second);
    }

    #[test]
    fn repeated_sabotage_keeps_working_on_plain_text() {
        let mut code = "a = 1;\nb = 2;\nc = a + b;\nprint(c);".to_string();
        let mut rng = rng();
        for kind in [
            SabotageType::SyntaxError,
            SabotageType::LogicSwap,
            SabotageType::ClearLine,
            SabotageType::SyntaxError,
            SabotageType::ClearLine,
        ] {
            code = apply_sabotage(kind, &code, &mut rng).new_code;
        }
        assert!(code.split('\n').count() <= 2);
    }

    #[test]
    fn power_cut_leaves_code_alone() {
        let outcome = apply_sabotage(SabotageType::PowerCut, "x = 1", &mut rng());
        assert!(outcome.success);
        assert_eq!(outcome.new_code, "x = 1");
    }
}
