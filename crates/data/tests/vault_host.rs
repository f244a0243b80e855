use roster_core::{
    parse_players, LinkIndex, MetadataStore, ModalPhase, PersonSuggest, PlayersModal,
    PlayersPlugin, Suggestion,
};
use roster_data::{open_vault, split_document, SkimFuzzy, Vault};
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, body).expect("write");
}

fn sample_vault() -> (TempDir, Vault) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "People/Ann Lee.md", "---\naliases:\n  - Annie\n---\nAnn.\n");
    write(root, "People/Bob.md", "Bob.\n");
    write(
        root,
        "Games/Catan.md",
        "---\nplayed: friday\nplayers:\n  - name: \"[[Ann Lee]]\"\n    score: 10\n    won: true\n  - name: Bob\n    score: 7\n---\nWith [[People/Cyrus]] and [[Bob]].\n",
    );
    write(root, ".obsidian/workspace.md", "ignored");
    let vault = open_vault(root).expect("open vault");
    (dir, vault)
}

#[test]
fn index_lists_files_aliases_and_unresolved_links() {
    let (_dir, vault) = sample_vault();
    let candidates = vault.link_suggestions();
    let summary: Vec<(String, bool, Option<String>)> = candidates
        .iter()
        .map(|c| (c.path.clone(), c.file.is_some(), c.alias.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Games/Catan.md".to_string(), true, None),
            ("People/Ann Lee.md".to_string(), true, None),
            ("People/Ann Lee.md".to_string(), true, Some("Annie".to_string())),
            ("People/Bob.md".to_string(), true, None),
            ("People/Cyrus".to_string(), false, None),
        ]
    );
}

#[test]
fn person_suggestions_come_from_the_people_folder() {
    let (_dir, vault) = sample_vault();
    let provider = PersonSuggest::new(&vault.settings().people_prefix, "Games/Catan.md");
    let fuzzy = SkimFuzzy::new();

    let all = provider.get_suggestions(&vault, &fuzzy, "");
    assert_eq!(all.len(), 4);

    let cyrus = provider.get_suggestions(&vault, &fuzzy, "cyr");
    assert_eq!(cyrus.len(), 1);
    assert_eq!(provider.link_for(&cyrus[0], &vault), "[[People/Cyrus]]");

    let annie = provider.get_suggestions(&vault, &fuzzy, "annie");
    let alias = annie
        .iter()
        .find(|s| matches!(s, Suggestion::Alias { .. }))
        .expect("alias suggestion");
    assert_eq!(provider.link_for(alias, &vault), "[[Ann Lee|Annie]]");

    assert!(provider
        .get_suggestions(&vault, &fuzzy, "zz_no_match")
        .is_empty());
}

#[test]
fn saving_rewrites_only_the_players_key() {
    let (dir, mut vault) = sample_vault();
    let file = vault.lookup("Games/Catan.md").expect("catan");
    let mut modal = PlayersModal::open(&vault, file, "players", None);
    assert_eq!(modal.len(), 2);
    let bob = modal.entries()[1].id;
    modal.set_won(bob, false);
    modal.set_team(bob, "Blue");
    let extra = modal.append();
    modal.set_name(extra, "[[People/Cyrus]]");
    modal.save(&mut vault).expect("save");
    assert_eq!(modal.phase(), ModalPhase::Saved);

    let text = fs::read_to_string(dir.path().join("Games/Catan.md")).expect("read");
    let document = split_document(&text).expect("split");
    let fm = document.frontmatter.expect("frontmatter");
    assert_eq!(fm.get("played"), Some(&Value::String("friday".into())));
    let players = parse_players(fm.get("players").expect("players"));
    let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["[[Ann Lee]]", "Bob", "[[People/Cyrus]]"]);
    assert_eq!(players[1].team.as_deref(), Some("Blue"));
    assert_eq!(players[1].won, None);
    assert_eq!(
        document.body,
        "With [[People/Cyrus]] and [[Bob]].\n"
    );
}

#[test]
fn open_then_save_round_trips() {
    let (_dir, mut vault) = sample_vault();
    let file = vault.lookup("Games/Catan.md").expect("catan");
    let before = vault.frontmatter(&file).expect("read").expect("fm");
    let mut modal = PlayersModal::open(&vault, file.clone(), "players", None);
    modal.save(&mut vault).expect("save");
    let after = vault.frontmatter(&file).expect("read").expect("fm");
    assert_eq!(
        parse_players(&after["players"]),
        parse_players(&before["players"])
    );
}

#[test]
fn note_without_frontmatter_gets_a_block() {
    let (dir, mut vault) = sample_vault();
    let file = vault.lookup("People/Bob.md").expect("bob");
    let mut modal = PlayersModal::open(&vault, file, "players", None);
    let id = modal.entries()[0].id;
    modal.set_name(id, "Bob");
    modal.save(&mut vault).expect("save");
    let text = fs::read_to_string(dir.path().join("People/Bob.md")).expect("read");
    assert_eq!(text, "---\nplayers:\n- name: Bob\n---\nBob.\n");
}

#[test]
fn programmatic_open_rejects_unknown_files() {
    let (_dir, vault) = sample_vault();
    let plugin = PlayersPlugin::new(vault.settings().property_key.clone());
    let missing = vault.lookup("Games/Nope.md");
    assert!(missing.is_none());
    let (modal, pending) = plugin.open_modal(&vault, missing.as_ref());
    assert!(modal.is_none());
    assert_eq!(pending.wait(), None);
    assert!(vault.lookup("../outside.md").is_none());
}
