//! IRC mode-string parsing.
//!
//! A mode string is a run of `+`/`-` toggled letters followed by the
//! arguments that some of those letters consume. Which letters take an
//! argument depends on the server's channel-user-mode table (ISUPPORT
//! `PREFIX`) and on RFC 2811 for the parameterized channel modes.

use crate::error::ModeParseError;
use crate::isupport::PrefixSpec;

/// One parsed mode toggle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeChange {
    /// `true` for `+`, `false` for `-`.
    pub add: bool,
    /// The mode letter.
    pub mode: char,
    /// The consumed argument, if the letter takes one.
    pub param: Option<String>,
}

impl ModeChange {
    /// Shorthand constructor used in tests and builders.
    pub fn new(add: bool, mode: char, param: Option<&str>) -> ModeChange {
        ModeChange {
            add,
            mode,
            param: param.map(str::to_string),
        }
    }
}

/// How a channel mode letter consumes its argument.
enum ArgRule {
    /// Never takes an argument.
    Never,
    /// Takes one when present; bare form is a list query (`+b`).
    ListMode,
    /// Required when setting; optional when unsetting (`k`).
    RequiredOnAdd,
    /// Required when setting; never when unsetting (`l`).
    OnAddOnly,
    /// Always required (channel-user modes take a nick).
    Required,
}

fn channel_arg_rule(mode: char, member_modes: &PrefixSpec) -> ArgRule {
    if member_modes.is_member_mode(mode) {
        return ArgRule::Required;
    }
    match mode {
        'b' | 'e' | 'I' => ArgRule::ListMode,
        'k' => ArgRule::RequiredOnAdd,
        'l' => ArgRule::OnAddOnly,
        _ => ArgRule::Never,
    }
}

/// Parse a channel mode string plus its follow-up arguments.
///
/// `pieces[0]` is the mode string; the rest are its arguments.
/// `member_modes` is the channel-user-mode table in effect.
pub fn parse_channel_modes(
    pieces: &[&str],
    member_modes: &PrefixSpec,
) -> Result<Vec<ModeChange>, ModeParseError> {
    parse_modes(pieces, |mode, add, args_left| {
        match channel_arg_rule(mode, member_modes) {
            ArgRule::Never => Ok(false),
            ArgRule::ListMode => Ok(args_left),
            ArgRule::Required => {
                if args_left {
                    Ok(true)
                } else {
                    Err(ModeParseError::MissingModeArgument { mode })
                }
            }
            ArgRule::RequiredOnAdd => {
                if add && !args_left {
                    Err(ModeParseError::MissingModeArgument { mode })
                } else {
                    Ok(args_left)
                }
            }
            ArgRule::OnAddOnly => {
                if !add {
                    Ok(false)
                } else if args_left {
                    Ok(true)
                } else {
                    Err(ModeParseError::MissingModeArgument { mode })
                }
            }
        }
    })
}

/// Parse a user mode string. User modes never take arguments.
pub fn parse_user_modes(pieces: &[&str]) -> Result<Vec<ModeChange>, ModeParseError> {
    parse_modes(pieces, |_, _, _| Ok(false))
}

fn parse_modes<F>(pieces: &[&str], mut takes_arg: F) -> Result<Vec<ModeChange>, ModeParseError>
where
    F: FnMut(char, bool, bool) -> Result<bool, ModeParseError>,
{
    let mut res = Vec::new();

    let (first, rest) = match pieces.split_first() {
        Some(split) => split,
        None => return Ok(res),
    };

    let mut args = rest.iter().copied().peekable();
    // A missing leading modifier reads as '+' (numeric 324 replies
    // occasionally omit it).
    let mut adding = true;

    for c in first.chars() {
        match c {
            '+' => adding = true,
            '-' => adding = false,
            _ => {
                let param = if takes_arg(c, adding, args.peek().is_some())? {
                    args.next().map(str::to_string)
                } else {
                    None
                };
                res.push(ModeChange {
                    add: adding,
                    mode: c,
                    param,
                });
            }
        }
    }

    let leftover = args.count();
    if leftover > 0 {
        return Err(ModeParseError::UnusedModeArguments(leftover));
    }

    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PrefixSpec {
        PrefixSpec::default_table()
    }

    #[test]
    fn test_member_mode_takes_nick() {
        let modes = parse_channel_modes(&["+o", "alice"], &table()).unwrap();
        assert_eq!(modes, vec![ModeChange::new(true, 'o', Some("alice"))]);
    }

    #[test]
    fn test_member_mode_requires_nick() {
        let result = parse_channel_modes(&["+o"], &table());
        assert_eq!(
            result,
            Err(ModeParseError::MissingModeArgument { mode: 'o' })
        );
    }

    #[test]
    fn test_ban_list_query_without_arg() {
        let modes = parse_channel_modes(&["+b"], &table()).unwrap();
        assert_eq!(modes, vec![ModeChange::new(true, 'b', None)]);
    }

    #[test]
    fn test_ban_with_mask() {
        let modes = parse_channel_modes(&["+b", "*!*@example.com"], &table()).unwrap();
        assert_eq!(
            modes,
            vec![ModeChange::new(true, 'b', Some("*!*@example.com"))]
        );
    }

    #[test]
    fn test_key_required_on_add() {
        assert!(parse_channel_modes(&["+k"], &table()).is_err());
        let modes = parse_channel_modes(&["+k", "secret"], &table()).unwrap();
        assert_eq!(modes, vec![ModeChange::new(true, 'k', Some("secret"))]);
        // -k accepts the key echo but does not require it.
        let modes = parse_channel_modes(&["-k"], &table()).unwrap();
        assert_eq!(modes, vec![ModeChange::new(false, 'k', None)]);
    }

    #[test]
    fn test_limit_only_on_add() {
        let modes = parse_channel_modes(&["+l", "25"], &table()).unwrap();
        assert_eq!(modes, vec![ModeChange::new(true, 'l', Some("25"))]);
        let modes = parse_channel_modes(&["-l"], &table()).unwrap();
        assert_eq!(modes, vec![ModeChange::new(false, 'l', None)]);
    }

    #[test]
    fn test_toggle_run() {
        let modes = parse_channel_modes(&["+nt-s+i"], &table()).unwrap();
        assert_eq!(
            modes,
            vec![
                ModeChange::new(true, 'n', None),
                ModeChange::new(true, 't', None),
                ModeChange::new(false, 's', None),
                ModeChange::new(true, 'i', None),
            ]
        );
    }

    #[test]
    fn test_mixed_member_and_channel_modes() {
        let modes = parse_channel_modes(&["+ov-b", "alice", "bob", "*!*@bad"], &table()).unwrap();
        assert_eq!(
            modes,
            vec![
                ModeChange::new(true, 'o', Some("alice")),
                ModeChange::new(true, 'v', Some("bob")),
                ModeChange::new(false, 'b', Some("*!*@bad")),
            ]
        );
    }

    #[test]
    fn test_missing_modifier_reads_as_add() {
        let modes = parse_channel_modes(&["tn"], &table()).unwrap();
        assert_eq!(
            modes,
            vec![
                ModeChange::new(true, 't', None),
                ModeChange::new(true, 'n', None),
            ]
        );
    }

    #[test]
    fn test_unused_arguments_rejected() {
        let result = parse_channel_modes(&["+t", "stray"], &table());
        assert_eq!(result, Err(ModeParseError::UnusedModeArguments(1)));
    }

    #[test]
    fn test_user_modes() {
        let modes = parse_user_modes(&["+iw-o"]).unwrap();
        assert_eq!(
            modes,
            vec![
                ModeChange::new(true, 'i', None),
                ModeChange::new(true, 'w', None),
                ModeChange::new(false, 'o', None),
            ]
        );
    }

    #[test]
    fn test_wider_prefix_table() {
        let spec = PrefixSpec::parse("(qaohv)~&@%+").unwrap();
        let modes = parse_channel_modes(&["+h", "carol"], &spec).unwrap();
        assert_eq!(modes, vec![ModeChange::new(true, 'h', Some("carol"))]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_channel_modes(&[], &table()).unwrap().is_empty());
        assert!(parse_user_modes(&["+"]).unwrap().is_empty());
    }
}
