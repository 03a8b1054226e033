use quiz_core::model::{
    Answer, Course, CourseId, EmailCaptureDraft, Question, QuestionId, ShareId, TestSession,
    TestResult,
};
use quiz_core::time::fixed_now;
use storage::catalog;
use storage::repository::{
    CourseRepository, EmailCaptureRepository, QuestionBank, Storage, StorageError,
    TestResultRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn question(id: &str, correct: usize, topic: &str) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Prompt {id}"),
        vec!["A".into(), "B".into(), "C".into()],
        correct,
        "Because.",
        topic,
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_courses_roundtrip_and_sort_by_name() {
    let repo = connect("memdb_courses").await;
    let zed = Course::new(CourseId::new("zed"), "Zed", "", None).unwrap();
    let alpha = Course::new(
        CourseId::new("alpha"),
        "Alpha",
        "First",
        Some("https://example.com/alpha"),
    )
    .unwrap();
    repo.upsert_course(&zed).await.unwrap();
    repo.upsert_course(&alpha).await.unwrap();

    let listed = repo.list_courses().await.unwrap();
    let names: Vec<&str> = listed.iter().map(Course::name).collect();
    assert_eq!(names, ["Alpha", "Zed"]);

    let fetched = repo.get_course(&CourseId::new("alpha")).await.unwrap();
    assert_eq!(fetched, Some(alpha));
    assert!(
        repo.get_course(&CourseId::new("missing"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn sqlite_question_bank_keeps_order_and_replaces() {
    let repo = connect("memdb_questions").await;
    let course = CourseId::new("acca");
    repo.replace_questions(
        &course,
        &[question("q2", 1, "Audit"), question("q1", 0, "Tax")],
    )
    .await
    .unwrap();

    let fetched = repo.questions_for_course(&course).await.unwrap();
    let ids: Vec<&str> = fetched.iter().map(|q| q.id().as_str()).collect();
    assert_eq!(ids, ["q2", "q1"]);
    assert_eq!(fetched[0].correct_answer_index(), 1);
    assert_eq!(fetched[0].options().len(), 3);

    repo.replace_questions(&course, &[question("q9", 2, "Ethics")])
        .await
        .unwrap();
    let fetched = repo.questions_for_course(&course).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].topic(), "Ethics");
}

#[tokio::test]
async fn sqlite_captures_filter_by_email_case_insensitively() {
    let repo = connect("memdb_captures").await;
    for email in ["Nurse@Example.com", "other@example.com"] {
        let capture = EmailCaptureDraft {
            course_id: CourseId::new("hesi-a2"),
            course_name: "HESI A2".into(),
            email: email.into(),
            score: 2,
            total_questions: 3,
        }
        .validate(fixed_now())
        .unwrap();
        repo.append_capture(&capture).await.unwrap();
    }

    let all = repo.list_captures().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].capture.percentage(), 67);

    let mine = repo
        .list_captures_by_email("nurse@example.com")
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].capture.course_name(), "HESI A2");
}

#[tokio::test]
async fn sqlite_results_keep_timeout_sentinel_and_reject_duplicates() {
    let repo = connect("memdb_results").await;
    let q1 = question("q1", 0, "Audit");
    let q2 = question("q2", 1, "Tax");
    let mut session =
        TestSession::initialize(CourseId::new("acca"), vec![q1.clone(), q2.clone()]).unwrap();
    session.submit_answer(Answer::grade(&q1, Some(0))).unwrap();
    session.submit_answer(Answer::grade(&q2, None)).unwrap();
    session.finalize_completion().unwrap();
    let result = TestResult::from_session(&session, fixed_now()).unwrap();

    repo.append_result(&result).await.unwrap();
    let err = repo.append_result(&result).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let fetched = repo.get_result_by_share_id(result.share_id()).await.unwrap();
    assert_eq!(fetched, result);
    assert_eq!(fetched.answers()[1].selected_answer_index(), -1);
    assert_eq!(fetched.percentage(), 50);

    let missing = repo.get_result_by_share_id(ShareId::generate()).await;
    assert!(matches!(missing, Err(StorageError::NotFound)));

    let rows = repo.list_results(10).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn sqlite_storage_loads_bundled_catalog() {
    let storage = Storage::sqlite("sqlite:file:memdb_catalog?mode=memory&cache=shared")
        .await
        .expect("storage");
    let entries = catalog::sample_catalog().unwrap();
    catalog::load_into(&storage, &entries).await.unwrap();
    // Loading twice must not duplicate questions.
    catalog::load_into(&storage, &entries).await.unwrap();

    let courses = storage.courses.list_courses().await.unwrap();
    assert_eq!(courses.len(), entries.len());
    let acca = storage
        .questions
        .questions_for_course(&CourseId::new("acca"))
        .await
        .unwrap();
    assert_eq!(acca.len(), 10);
    assert_eq!(acca[0].id(), &QuestionId::new("acca-q1"));
    let hesi_exit = storage
        .questions
        .questions_for_course(&CourseId::new("hesi-exit"))
        .await
        .unwrap();
    assert_eq!(hesi_exit.len(), 10);
}
