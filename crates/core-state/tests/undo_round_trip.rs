use core_state::UndoRedoManager;
use core_text::{Document, NullObserver, Ordinal};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    Insert { at: usize, text: String },
    Delete { at: usize, len: usize },
    Transaction(Vec<(usize, String)>),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..64, "[a-c \n]{1,5}").prop_map(|(at, text)| Edit::Insert { at, text }),
        (0usize..64, 1usize..6).prop_map(|(at, len)| Edit::Delete { at, len }),
        prop::collection::vec((0usize..64, "[xy ]{1,3}"), 1..4).prop_map(Edit::Transaction),
    ]
}

fn apply(doc: &mut Document, undo: &mut UndoRedoManager, edit: &Edit) {
    let body = doc.len() - 1;
    match edit {
        Edit::Insert { at, text } => doc.insert(Ordinal::new(at % (body + 1)), text, undo),
        Edit::Delete { at, len } => {
            if body == 0 {
                return;
            }
            let at = at % body;
            let len = (*len).min(body - at);
            doc.delete_at(Ordinal::new(at), len, undo);
        }
        Edit::Transaction(inserts) => {
            undo.begin_transaction();
            for (at, text) in inserts {
                let body = doc.len() - 1;
                doc.insert(Ordinal::new(at % (body + 1)), text, undo);
            }
            undo.end_transaction();
        }
    }
}

proptest! {
    #[test]
    fn undo_all_restores_original_and_redo_all_restores_edits(
        original in "[a-c \n]{0,24}",
        edits in prop::collection::vec(edit(), 1..24),
    ) {
        let mut doc = Document::from_text(&original);
        let mut undo = UndoRedoManager::new();
        for e in &edits {
            apply(&mut doc, &mut undo, e);
        }
        let edited = doc.text();

        while undo.can_undo() {
            undo.undo(&mut doc, &mut NullObserver);
        }
        prop_assert_eq!(doc.text(), original);

        while undo.can_redo() {
            undo.redo(&mut doc, &mut NullObserver);
        }
        prop_assert_eq!(doc.text(), edited);
    }

    #[test]
    fn interleaved_undo_and_new_edits_stay_consistent(
        original in "[a-c \n]{0,16}",
        first in prop::collection::vec(edit(), 1..10),
        undo_steps in 0usize..6,
        second in prop::collection::vec(edit(), 1..10),
    ) {
        let mut doc = Document::from_text(&original);
        let mut undo = UndoRedoManager::new();
        for e in &first {
            apply(&mut doc, &mut undo, e);
        }
        for _ in 0..undo_steps {
            undo.undo(&mut doc, &mut NullObserver);
        }
        for e in &second {
            apply(&mut doc, &mut undo, e);
        }
        prop_assert!(!undo.can_redo());
        while undo.can_undo() {
            undo.undo(&mut doc, &mut NullObserver);
        }
        prop_assert_eq!(doc.text(), original);
    }
}

#[test]
fn undo_returns_caret_targets() {
    let mut doc = Document::from_text("hello world");
    let mut undo = UndoRedoManager::new();
    doc.delete_at(Ordinal::new(5), 6, &mut undo);
    doc.insert(Ordinal::new(5), ", there", &mut undo);
    assert_eq!(doc.text(), "hello, there");

    assert_eq!(undo.undo(&mut doc, &mut NullObserver), Some(Ordinal::new(5)));
    assert_eq!(doc.text(), "hello");
    assert_eq!(undo.undo(&mut doc, &mut NullObserver), Some(Ordinal::new(11)));
    assert_eq!(doc.text(), "hello world");
    assert_eq!(undo.redo(&mut doc, &mut NullObserver), Some(Ordinal::new(5)));
    assert_eq!(undo.redo(&mut doc, &mut NullObserver), Some(Ordinal::new(12)));
    assert_eq!(doc.text(), "hello, there");
}
