use chrono::NaiveDate;
use journal_core::{
    Clock, ErrorKind, FixedClock, PromptRepository, RepoError, ResponseRepository,
    SqlitePromptRepository, SqliteResponseRepository, Store,
};

fn clock() -> FixedClock {
    FixedClock::at_noon(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap())
}

fn table_count(store: &Store, table: &str) -> i64 {
    store
        .connection()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn add_and_get_prompt_roundtrip() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);

    let added = prompts.add("What am I grateful for today?").unwrap();
    assert!(added.id > 0);
    assert!(added.is_unassigned());
    assert_eq!(added.created_at, clock.now_millis());

    let loaded = prompts.get(added.id).unwrap();
    assert_eq!(loaded, added);
}

#[test]
fn blank_prompt_is_invalid_input_and_not_stored() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);

    let err = prompts.add("   ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(prompts.count().unwrap(), 0);
}

#[test]
fn list_all_is_newest_first() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);

    let first = prompts.add("first").unwrap();
    clock.advance_millis(10);
    let second = prompts.add("second").unwrap();
    // Same timestamp as `second`; id breaks the tie.
    let third = prompts.add("third").unwrap();

    let ids: Vec<_> = prompts.list_all().unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[test]
fn update_prompt_replaces_text_and_missing_id_is_not_found() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);

    let prompt = prompts.add("draft question").unwrap();
    let updated = prompts.update(prompt.id, "final question").unwrap();
    assert_eq!(updated.text, "final question");
    assert_eq!(updated.created_at, prompt.created_at);

    let err = prompts.update(9_999, "anything").unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "prompt",
            id: 9_999
        }
    ));
    assert!(matches!(
        prompts.get(9_999),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn response_requires_existing_prompt() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let responses = SqliteResponseRepository::new(&store, &clock);

    let err = responses.add(77, "no parent").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(table_count(&store, "responses"), 0);
}

#[test]
fn responses_keep_history_per_prompt() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);
    let responses = SqliteResponseRepository::new(&store, &clock);

    let prompt = prompts.add("What did I learn?").unwrap();
    let other = prompts.add("What brings me joy?").unwrap();
    let older = responses.add(prompt.id, "patience").unwrap();
    clock.advance_millis(1_000);
    let newer = responses.add(prompt.id, "more patience").unwrap();
    responses.add(other.id, "music").unwrap();

    let history = responses.list_for_prompt(prompt.id).unwrap();
    let ids: Vec<_> = history.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert_eq!(responses.list_all().unwrap().len(), 3);
    assert!(responses.list_for_prompt(12_345).unwrap().is_empty());
}

#[test]
fn update_response_refreshes_updated_at_only() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);
    let responses = SqliteResponseRepository::new(&store, &clock);

    let prompt = prompts.add("question").unwrap();
    let response = responses.add(prompt.id, "first answer").unwrap();
    clock.advance_millis(5_000);

    let updated = responses.update(response.id, "second answer").unwrap();
    assert_eq!(updated.text, "second answer");
    assert_eq!(updated.created_at, response.created_at);
    assert_eq!(updated.updated_at, response.updated_at + 5_000);

    assert_eq!(
        responses.update(response.id, "").unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
    assert_eq!(
        responses.update(404, "text").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn delete_response_removes_single_row() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);
    let responses = SqliteResponseRepository::new(&store, &clock);

    let prompt = prompts.add("question").unwrap();
    let keep = responses.add(prompt.id, "keep").unwrap();
    let gone = responses.add(prompt.id, "gone").unwrap();

    responses.delete(gone.id).unwrap();
    assert_eq!(responses.list_all().unwrap(), vec![keep]);
    assert_eq!(responses.delete(gone.id).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(prompts.count().unwrap(), 1);
}

#[test]
fn deleting_prompt_cascades_to_responses() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);
    let responses = SqliteResponseRepository::new(&store, &clock);

    let prompt = prompts.add("cascade me").unwrap();
    let survivor = prompts.add("unrelated").unwrap();
    for text in ["one", "two", "three"] {
        responses.add(prompt.id, text).unwrap();
    }
    let kept = responses.add(survivor.id, "stays").unwrap();

    prompts.delete(prompt.id).unwrap();

    assert!(prompts.list_all().unwrap().iter().all(|p| p.id != prompt.id));
    assert_eq!(responses.list_all().unwrap(), vec![kept]);
    assert_eq!(prompts.delete(prompt.id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn failed_cascade_leaves_prompt_and_responses_intact() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);
    let responses = SqliteResponseRepository::new(&store, &clock);

    let prompt = prompts.add("protected").unwrap();
    for text in ["one", "two", "three"] {
        responses.add(prompt.id, text).unwrap();
    }

    // Fails the parent delete after the child rows were already removed.
    store
        .connection()
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER reject_prompt_delete
             BEFORE DELETE ON prompts
             BEGIN
                 SELECT RAISE(ABORT, 'injected failure');
             END;",
        )
        .unwrap();

    let err = prompts.delete(prompt.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    assert_eq!(prompts.list_all().unwrap().len(), 1);
    assert_eq!(responses.list_for_prompt(prompt.id).unwrap().len(), 3);
    assert_eq!(table_count(&store, "prompts") + table_count(&store, "responses"), 4);
}

#[test]
fn day_scoped_response_views() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);
    let responses = SqliteResponseRepository::new(&store, &clock);

    let may = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
    let prompt = prompts.add("daily").unwrap();

    clock.set_date(may(1));
    let old = responses.add(prompt.id, "long ago").unwrap();
    clock.set_date(may(8));
    let two_days_ago = responses.add(prompt.id, "two days ago").unwrap();
    clock.set_date(may(10));
    assert!(responses.latest_today().unwrap().is_none());
    let morning = responses.add(prompt.id, "today early").unwrap();
    clock.advance_millis(60_000);
    let later = responses.add(prompt.id, "today later").unwrap();

    let on_eighth: Vec<_> = responses
        .list_on_date(may(8))
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(on_eighth, vec![two_days_ago.id]);

    let recent: Vec<_> = responses
        .list_recent(3)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(recent, vec![later.id, morning.id, two_days_ago.id]);
    assert_eq!(responses.list_recent(1).unwrap().len(), 2);
    assert!(responses.list_recent(0).unwrap().is_empty());
    assert_eq!(responses.list_recent(30).unwrap().last().unwrap().id, old.id);

    let answered = responses.latest_today().unwrap().unwrap();
    assert_eq!(answered.response.id, later.id);
    assert_eq!(answered.prompt.id, prompt.id);
}

#[test]
fn random_prompt_does_not_assign() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);

    assert!(prompts.random().unwrap().is_none());
    prompts.add("a").unwrap();
    prompts.add("b").unwrap();

    let picked = prompts.random().unwrap().unwrap();
    assert!(["a", "b"].contains(&picked.text.as_str()));
    assert!(prompts.list_all().unwrap().iter().all(|p| p.is_unassigned()));
}

#[test]
fn records_serialize_as_camel_case() {
    let store = Store::open_in_memory().unwrap();
    let clock = clock();
    let prompts = SqlitePromptRepository::new(&store, &clock);
    let responses = SqliteResponseRepository::new(&store, &clock);

    let prompt = prompts.add("serialize me").unwrap();
    let response = responses.add(prompt.id, "ok").unwrap();

    let prompt_json = serde_json::to_value(&prompt).unwrap();
    assert!(prompt_json.get("assignedDate").unwrap().is_null());
    assert!(prompt_json.get("createdAt").is_some());

    let response_json = serde_json::to_value(&response).unwrap();
    assert_eq!(response_json["promptId"], prompt.id);
    assert_eq!(response_json["updatedAt"], response.updated_at);
}
