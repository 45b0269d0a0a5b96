use crate::model::ContractInterface;
use crate::writer::menu::entry_label;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Invoke(String),
    DisplayState,
    Exit,
}

/// One selectable line. Built fresh for every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// 1-based, contiguous; what the user types to select it.
    pub id: usize,
    pub label: String,
    pub description: String,
    pub is_read_only: bool,
    pub action: MenuAction,
}

/// One entry per function, then "Display contract state" and "Exit".
pub fn build_menu(iface: &ContractInterface) -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = iface
        .functions
        .iter()
        .enumerate()
        .map(|(i, f)| MenuItem {
            id: i + 1,
            label: entry_label(i + 1, f),
            description: f.description.clone(),
            is_read_only: f.is_read_only(),
            action: MenuAction::Invoke(f.name.clone()),
        })
        .collect();

    let state_id = items.len() + 1;
    items.push(MenuItem {
        id: state_id,
        label: format!("{state_id}. Display contract state"),
        description: "Show the current value of every ledger field".to_string(),
        is_read_only: true,
        action: MenuAction::DisplayState,
    });

    let exit_id = items.len() + 1;
    items.push(MenuItem {
        id: exit_id,
        label: format!("{exit_id}. Exit"),
        description: "Leave the session".to_string(),
        is_read_only: true,
        action: MenuAction::Exit,
    });

    items
}

pub fn select<'a>(items: &'a [MenuItem], input: &str) -> Option<&'a MenuItem> {
    let id: usize = input.trim().parse().ok()?;
    items.iter().find(|item| item.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::analyze;

    #[test]
    fn test_menu_has_n_plus_two_contiguous_items() {
        let test_cases = vec![
            "",
            "export circuit a(): [] {}",
            "export circuit a(): [] {} export circuit b(x: Field): Field {} export circuit c(): [] {}",
        ];

        for src in test_cases {
            let iface = analyze(src, "m.compact");
            let menu = build_menu(&iface);
            let n = iface.functions.len();

            assert_eq!(menu.len(), n + 2);
            for (i, item) in menu.iter().enumerate() {
                assert_eq!(item.id, i + 1);
                assert!(item.label.starts_with(&format!("{}. ", i + 1)));
            }
            assert_eq!(menu[n].action, MenuAction::DisplayState);
            assert_eq!(menu[n + 1].action, MenuAction::Exit);
        }
    }

    #[test]
    fn test_labels_and_flags() {
        let iface = analyze(
            "export circuit get_vote_count(index: Uint<8>): Uint<64> {}\nexport circuit vote_for(index: Uint<8>): [] {}",
            "v.compact",
        );
        let menu = build_menu(&iface);

        assert_eq!(menu[0].label, "1. Get Vote Count(1 params)");
        assert!(menu[0].is_read_only);
        assert_eq!(menu[1].label, "2. Vote For(1 params)");
        assert!(!menu[1].is_read_only);
    }

    #[test]
    fn test_select() {
        let menu = build_menu(&analyze("export circuit a(): [] {}", "m.compact"));
        let test_cases = vec![("1", Some(1)), (" 3 ", Some(3)), ("0", None), ("4", None), ("x", None)];

        for (input, expected) in test_cases {
            assert_eq!(select(&menu, input).map(|i| i.id), expected, "{input:?}");
        }
    }
}
