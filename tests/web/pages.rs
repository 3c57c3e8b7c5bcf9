use std::sync::Arc;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use student_records::web::{Flash, FlashKind};
use student_records::{RecordStore, StudentRecord};

use crate::support::{
    ada, client, flash, follow, grace, location, start_server, start_with, UnavailableStore,
};

#[tokio::test]
async fn index_lists_all_students() {
    let (base, _store) = start_with(vec![ada(), grace()]).await;

    let resp = client().get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("All students (2)"));
    assert!(body.contains("Grace Hopper"));
    assert!(body.contains(r#"href="/edit/R1""#));
}

#[tokio::test]
async fn add_student_redirects_with_success_message() {
    let (base, store) = start_with(vec![]).await;
    let client = client();

    let resp = client
        .post(format!("{base}/add"))
        .form(&[
            ("name", " Ada "),
            ("reg_number", "R1"),
            ("department", "CS"),
            ("level", "200"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let message = flash(&resp).unwrap();
    assert_eq!(message.kind, FlashKind::Success);
    assert_eq!(message.message, "Student Ada added successfully!");

    assert_eq!(store.get("R1").unwrap(), Some(ada()));

    // The next page shows the message once and clears the cookie.
    let page = follow(&client, &base, resp).await;
    assert_eq!(page.status(), StatusCode::OK);
    let cleared = page.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cleared.contains("Max-Age=0"));
    let body = page.text().await.unwrap();
    assert!(body.contains(r#"<div class="alert success">Student Ada added successfully!</div>"#));
}

#[tokio::test]
async fn add_with_blank_field_redirects_back() {
    let (base, store) = start_with(vec![]).await;

    let resp = client()
        .post(format!("{base}/add"))
        .form(&[
            ("name", "Ada"),
            ("reg_number", "R1"),
            ("department", "   "),
            ("level", "200"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/add");
    assert_eq!(flash(&resp).unwrap().message, "All fields are required!");
    assert!(store.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn add_with_missing_field_redirects_back() {
    let (base, _store) = start_with(vec![]).await;

    let resp = client()
        .post(format!("{base}/add"))
        .form(&[("name", "Ada")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(flash(&resp).unwrap().kind, FlashKind::Error);
}

#[tokio::test]
async fn add_duplicate_is_rejected_and_original_kept() {
    let (base, store) = start_with(vec![ada()]).await;

    let resp = client()
        .post(format!("{base}/add"))
        .form(&[
            ("name", "Impostor"),
            ("reg_number", "R1"),
            ("department", "EE"),
            ("level", "100"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/add");
    assert_eq!(
        flash(&resp).unwrap().message,
        "Registration number R1 already exists!"
    );
    assert_eq!(store.get("R1").unwrap().unwrap().name, "Ada");
}

#[tokio::test]
async fn add_page_renders_form() {
    let (base, _store) = start_with(vec![]).await;
    let resp = client().get(format!("{base}/add")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains(r#"action="/add""#));
}

#[tokio::test]
async fn edit_page_shows_current_values() {
    let (base, _store) = start_with(vec![ada()]).await;

    let resp = client().get(format!("{base}/edit/R1")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains(r#"name="name" value="Ada""#));
    assert!(body.contains(r#"value="R1" disabled"#));
}

#[tokio::test]
async fn edit_unknown_student_redirects_home() {
    let (base, _store) = start_with(vec![]).await;

    let resp = client().get(format!("{base}/edit/NOPE")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    assert_eq!(flash(&resp).unwrap().message, "Student not found!");
}

#[tokio::test]
async fn edit_submit_replaces_fields_and_keeps_key() {
    let (base, store) = start_with(vec![ada(), grace()]).await;

    let resp = client()
        .post(format!("{base}/edit/R1"))
        .form(&[
            ("name", "Ada King"),
            ("reg_number", "HIJACKED"),
            ("department", "Engineering"),
            ("level", "300"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    assert_eq!(
        flash(&resp).unwrap().message,
        "Student record updated successfully!"
    );

    assert_eq!(
        store.get("R1").unwrap(),
        Some(StudentRecord::new("Ada King", "R1", "Engineering", "300"))
    );
    assert!(store.get("HIJACKED").unwrap().is_none());
    assert_eq!(store.list_all().unwrap().len(), 2);
}

#[tokio::test]
async fn edit_submit_with_blank_field_returns_to_form() {
    let (base, store) = start_with(vec![ada()]).await;

    let resp = client()
        .post(format!("{base}/edit/R1"))
        .form(&[("name", ""), ("department", "CS"), ("level", "200")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/edit/R1");
    assert_eq!(flash(&resp).unwrap().message, "All fields are required!");
    assert_eq!(store.get("R1").unwrap(), Some(ada()));
}

#[tokio::test]
async fn edit_submit_for_unknown_key_reports_not_found() {
    let (base, store) = start_with(vec![]).await;

    let resp = client()
        .post(format!("{base}/edit/R9"))
        .form(&[("name", "X"), ("department", "Y"), ("level", "Z")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/");
    assert_eq!(flash(&resp).unwrap().message, "Student not found!");
    assert!(store.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn keys_with_reserved_characters_work_in_paths() {
    let odd = StudentRecord::new("Odd", "CS/01 A", "CS", "100");
    let (base, store) = start_with(vec![odd]).await;

    let resp = client()
        .get(format!("{base}/edit/CS%2F01%20A"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client()
        .post(format!("{base}/delete/CS%2F01%20A"))
        .send()
        .await
        .unwrap();
    assert_eq!(flash(&resp).unwrap().kind, FlashKind::Success);
    assert!(store.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn delete_removes_student_once() {
    let (base, store) = start_with(vec![ada(), grace()]).await;
    let client = client();

    let resp = client.post(format!("{base}/delete/R1")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    assert_eq!(
        flash(&resp).unwrap().message,
        "Student record deleted successfully!"
    );
    assert_eq!(store.list_all().unwrap(), vec![grace()]);

    let resp = client.post(format!("{base}/delete/R1")).send().await.unwrap();
    let message = flash(&resp).unwrap();
    assert_eq!(message.kind, FlashKind::Error);
    assert_eq!(message.message, "Error deleting student record!");
}

#[tokio::test]
async fn search_with_empty_query_redirects_home() {
    let (base, _store) = start_with(vec![ada()]).await;

    for url in [format!("{base}/search"), format!("{base}/search?q=%20%20")] {
        let resp = client().get(url).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");
    }
}

#[tokio::test]
async fn search_matches_department_case_insensitively() {
    let (base, _store) = start_with(vec![ada(), grace()]).await;

    let resp = client()
        .get(format!("{base}/search?q=cs"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains(r#"Search results for "cs" (1)"#));
    assert!(body.contains("<td>Ada</td>"));
    assert!(!body.contains("Grace Hopper"));
}

#[tokio::test]
async fn search_without_matches_warns() {
    let (base, _store) = start_with(vec![ada()]).await;

    let body = client()
        .get(format!("{base}/search?q=chemistry"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(r#"class="alert warning">No student found matching: chemistry"#));
}

#[tokio::test]
async fn index_accepts_query_parameter() {
    let (base, _store) = start_with(vec![ada(), grace()]).await;

    let body = client()
        .get(format!("{base}/?q=hopper"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(r#"Search results for "hopper" (1)"#));
    assert!(body.contains("Grace Hopper"));
}

#[tokio::test]
async fn unavailable_store_is_reported_not_hidden() {
    let base = start_server(Arc::new(UnavailableStore)).await;
    let client = client();

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(resp
        .text()
        .await
        .unwrap()
        .contains("Storage unavailable, please try again later."));

    let resp = client.get(format!("{base}/edit/R1")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = client
        .post(format!("{base}/add"))
        .form(&[
            ("name", "Ada"),
            ("reg_number", "R1"),
            ("department", "CS"),
            ("level", "200"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/add");
    assert_eq!(
        flash(&resp).unwrap().message,
        "Storage unavailable, please try again later."
    );

    let resp = client.post(format!("{base}/delete/R1")).send().await.unwrap();
    assert_eq!(flash(&resp).unwrap().kind, FlashKind::Error);
}

#[tokio::test]
async fn pending_flash_survives_an_unavailable_list() {
    let base = start_server(Arc::new(UnavailableStore)).await;
    let pending = Flash::success("Student added successfully!");

    let resp = client()
        .get(format!("{base}/"))
        .header(COOKIE, format!("flash={}", pending.encode()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(resp.headers().get(SET_COOKIE).is_none());
    assert!(resp
        .text()
        .await
        .unwrap()
        .contains("Storage unavailable, please try again later."));
}

#[tokio::test]
async fn pending_flash_survives_an_empty_search() {
    let (base, _store) = start_with(vec![ada()]).await;
    let pending = Flash::success("Student deleted successfully!");

    let resp = client()
        .get(format!("{base}/search?q=nobody"))
        .header(COOKIE, format!("flash={}", pending.encode()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(SET_COOKIE).is_none());
    assert!(resp
        .text()
        .await
        .unwrap()
        .contains("No student found matching: nobody"));
}

#[tokio::test]
async fn script_is_served() {
    let (base, _store) = start_with(vec![]).await;

    let resp = client()
        .get(format!("{base}/static/script.js"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("function confirmDelete"));
}
