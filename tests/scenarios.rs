use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use securemail::{
    project, unread_count, App, EmailStore, Folder, FolderFilter, Role, Selection, UIConfig,
    ViewQuery,
};

fn ids(store: &EmailStore, query: &ViewQuery) -> Vec<u32> {
    project(store, query).iter().map(|e| e.id).collect()
}

fn app(role: Role) -> App {
    let ui = UIConfig {
        loading_delay_ms: 0,
        ..UIConfig::default()
    };
    App::new(EmailStore::with_sample_data(), role, FolderFilter::All, ui)
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
}

#[test]
fn user_all_no_search() {
    let store = EmailStore::with_sample_data();
    let query = ViewQuery::new(FolderFilter::All, "", Role::User);
    assert_eq!(ids(&store, &query), vec![1, 3, 5, 6]);
    assert_eq!(unread_count(&store, Role::User), 2);
}

#[test]
fn admin_inbox_no_search() {
    let store = EmailStore::with_sample_data();
    let query = ViewQuery::new(FolderFilter::Only(Folder::Inbox), "", Role::Admin);
    assert_eq!(ids(&store, &query), vec![4, 7]);
    assert_eq!(unread_count(&store, Role::Admin), 2);
}

#[test]
fn user_search_report() {
    let store = EmailStore::with_sample_data();
    let query = ViewQuery::new(FolderFilter::All, "report", Role::User);
    assert_eq!(ids(&store, &query), vec![3]);
}

#[test]
fn opening_unread_email_lowers_badge() {
    let mut app = app(Role::User);
    let before = app.unread_count();

    // id 1 is the first row
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.selection.email().map(|e| e.id), Some(1));
    press(&mut app, KeyCode::Esc);

    assert!(app.store.get(1).unwrap().read);
    assert_eq!(app.unread_count(), before - 1);
}

#[test]
fn not_spam_from_detail_view() {
    let mut app = app(Role::Admin);
    press(&mut app, KeyCode::Char('3'));
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.selection.email().map(|e| e.folder), Some(Folder::Spam));

    press(&mut app, KeyCode::Char('s'));
    assert_eq!(app.store.get(2).unwrap().folder, Folder::Inbox);
    assert_eq!(app.selection, Selection::NoSelection);

    press(&mut app, KeyCode::Char('2'));
    let inbox: Vec<u32> = app.visible_emails().iter().map(|e| e.id).collect();
    assert_eq!(inbox, vec![2, 4, 7]);
}

#[test]
fn earlier_snapshots_survive_mutation() {
    let first = EmailStore::with_sample_data();
    let second = first.mark_read(5).move_folder(5, Folder::Archived);

    let old = first.get(5).unwrap();
    assert!(!old.read);
    assert_eq!(old.folder, Folder::Inbox);

    let new = second.get(5).unwrap();
    assert!(new.read);
    assert_eq!(new.folder, Folder::Archived);
}

#[test]
fn role_switch_keeps_unread_independent_of_view() {
    let mut app = app(Role::User);
    press(&mut app, KeyCode::Char('4'));
    press(&mut app, KeyCode::Char('/'));
    press(&mut app, KeyCode::Char('x'));
    assert_eq!(app.unread_count(), 2);

    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Char('u'));
    assert_eq!(app.role, Role::Admin);
    assert_eq!(app.unread_count(), 2);
    assert!(app.visible_emails().is_empty());
}
