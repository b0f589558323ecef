use crate::{
    services::{
        rendition_handle, AuthService, FileService, ThumbnailQueue, ThumbnailService,
        UserService, RENDITION_WIDTHS,
    },
    stores::{
        models::{File, FileKind},
        DocumentStore,
    },
    test::{
        create_test_rocket_instance,
        helpers::{create_initial_user, png_bytes, upload_content, upload_folder},
    },
};
use base64::{prelude::BASE64_STANDARD, Engine};
use rocket::{
    http::{Accept, ContentType, Header, Status},
    local::asynchronous::Client,
};
use std::{collections::HashSet, sync::Arc};
use uuid::Uuid;

async fn setup() -> (
    Client,
    crate::test::StorageDropper,
    crate::stores::models::User,
    String,
) {
    let (rocket, storage_dropper) = create_test_rocket_instance().await;
    let client = Client::tracked(rocket).await.unwrap();
    let auth_service = client.rocket().state::<Arc<AuthService>>().unwrap();
    let user_service = client.rocket().state::<Arc<UserService>>().unwrap();

    let (user, token) = create_initial_user(auth_service, user_service).await;

    (client, storage_dropper, user, token)
}

#[rocket::async_test]
async fn test_create_folder() {
    let (client, _storage_dropper, user, token) = setup().await;

    let folder = upload_folder(&client, &token, "Docs", None).await;

    assert_eq!(folder.owner_id, user.id);
    assert_eq!(folder.name, "Docs");
    assert_eq!(folder.kind, FileKind::Folder);
    assert_eq!(folder.parent_id, None);
    assert!(!folder.is_public);

    // a folder never carries a blob
    let document_store = client
        .rocket()
        .state::<Arc<dyn DocumentStore + Send + Sync>>()
        .unwrap();
    let raw_folder = document_store
        .file_by_id(folder.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw_folder.local_path, None);

    // fetching it right after returns the identical record
    let response = client
        .get(format!("/files/{}", folder.id))
        .header(Accept::JSON)
        .header(Header::new("x-token", token))
        .dispatch()
        .await;

    let status = response.status();
    let fetched = response.into_json::<File>().await.unwrap();

    assert_eq!(status, Status::Ok);
    assert_eq!(fetched, folder);
}

#[rocket::async_test]
async fn test_create_file_representation() {
    let (client, _storage_dropper, user, token) = setup().await;

    let response = client
        .post("/files")
        .header(Accept::JSON)
        .header(ContentType::JSON)
        .header(Header::new("x-token", token))
        .body(
            serde_json::json!({
                "name": "hello.txt",
                "type": "file",
                "data": BASE64_STANDARD.encode("Hello, world!\n"),
            })
            .to_string(),
        )
        .dispatch()
        .await;

    let status = response.status();
    let body = response.into_json::<serde_json::Value>().await.unwrap();

    assert_eq!(status, Status::Created);
    assert_eq!(body["userId"], serde_json::json!(user.id));
    assert_eq!(body["name"], "hello.txt");
    assert_eq!(body["type"], "file");
    assert_eq!(body["isPublic"], false);
    assert_eq!(body["parentId"], serde_json::Value::Null);
    // the blob handle stays internal
    assert!(body.get("localPath").is_none());
    assert!(body.get("local_path").is_none());
}

#[rocket::async_test]
async fn test_create_file_field_validations() {
    let (client, _storage_dropper, _user, token) = setup().await;

    let cases = [
        (serde_json::json!({ "type": "file" }), "Missing name"),
        (serde_json::json!({ "name": "" , "type": "file" }), "Missing name"),
        (serde_json::json!({ "name": "a.txt" }), "Missing type"),
        (
            serde_json::json!({ "name": "a.txt", "type": "document" }),
            "Missing type",
        ),
        (
            serde_json::json!({ "name": "a.txt", "type": "file" }),
            "Missing data",
        ),
        (
            serde_json::json!({ "name": "a.txt", "type": "file", "data": "%%%" }),
            "Missing data",
        ),
        (
            serde_json::json!({
                "name": "a.txt",
                "type": "file",
                "data": BASE64_STANDARD.encode("x"),
                "parentId": Uuid::new_v4(),
            }),
            "Parent not found",
        ),
        (
            serde_json::json!({
                "name": "a.txt",
                "type": "file",
                "data": BASE64_STANDARD.encode("x"),
                "parentId": "not-a-uuid",
            }),
            "Parent not found",
        ),
    ];

    for (body, expected_error) in cases {
        let response = client
            .post("/files")
            .header(Accept::JSON)
            .header(ContentType::JSON)
            .header(Header::new("x-token", token.clone()))
            .body(body.to_string())
            .dispatch()
            .await;

        let status = response.status();
        let body = response.into_json::<serde_json::Value>().await.unwrap();

        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["error"], expected_error);
    }
}

#[rocket::async_test]
async fn test_create_file_rejects_non_folder_parent() {
    let (client, _storage_dropper, user, token) = setup().await;
    let file_service = client.rocket().state::<Arc<FileService>>().unwrap();

    let file = upload_content(&client, &token, "a.txt", "file", None, b"content").await;

    let response = client
        .post("/files")
        .header(Accept::JSON)
        .header(ContentType::JSON)
        .header(Header::new("x-token", token))
        .body(
            serde_json::json!({
                "name": "b.txt",
                "type": "file",
                "data": BASE64_STANDARD.encode("content"),
                "parentId": file.id,
            })
            .to_string(),
        )
        .dispatch()
        .await;

    let status = response.status();
    let body = response.into_json::<serde_json::Value>().await.unwrap();

    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"], "Parent is not a folder");

    // nothing was inserted for the rejected upload
    let files = file_service.list_files(user.id, None, 0).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, file.id);
}

#[rocket::async_test]
async fn test_uploads_require_a_token() {
    let (client, _storage_dropper, _user, _token) = setup().await;

    let response = client
        .post("/files")
        .header(Accept::JSON)
        .header(ContentType::JSON)
        .body(serde_json::json!({ "name": "Docs", "type": "folder" }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn test_image_upload_enqueues_a_thumbnail_job() {
    let (client, _storage_dropper, user, token) = setup().await;
    let thumbnail_queue = client
        .rocket()
        .state::<Arc<dyn ThumbnailQueue + Send + Sync>>()
        .unwrap();

    let image = upload_content(
        &client,
        &token,
        "photo.png",
        "image",
        None,
        &png_bytes(640, 480),
    )
    .await;

    let job = thumbnail_queue.dequeue().await.unwrap();

    assert_eq!(job.file_id, Some(image.id));
    assert_eq!(job.user_id, Some(user.id));
}

#[rocket::async_test]
async fn test_plain_file_uploads_do_not_enqueue_jobs() {
    let (client, _storage_dropper, user, token) = setup().await;
    let file_service = client.rocket().state::<Arc<FileService>>().unwrap();
    let thumbnail_queue = client
        .rocket()
        .state::<Arc<dyn ThumbnailQueue + Send + Sync>>()
        .unwrap();

    upload_content(&client, &token, "a.txt", "file", None, b"content").await;
    upload_folder(&client, &token, "Docs", None).await;

    // an image upload afterwards produces the first and only job
    let image = upload_content(
        &client,
        &token,
        "photo.png",
        "image",
        None,
        &png_bytes(64, 64),
    )
    .await;

    let job = thumbnail_queue.dequeue().await.unwrap();
    assert_eq!(job.file_id, Some(image.id));

    let files = file_service.list_files(user.id, None, 0).await.unwrap();
    assert_eq!(files.len(), 3);
}

#[rocket::async_test]
async fn test_get_file_hides_other_users_files() {
    let (client, _storage_dropper, _user, token) = setup().await;
    let auth_service = client.rocket().state::<Arc<AuthService>>().unwrap();
    let user_service = client.rocket().state::<Arc<UserService>>().unwrap();

    let file = upload_content(&client, &token, "secret.txt", "file", None, b"secret").await;

    let other_user = crate::test::helpers::create_user("other", user_service).await;
    let other_token = auth_service.create_session(other_user.id).await.unwrap();

    let response = client
        .get(format!("/files/{}", file.id))
        .header(Accept::JSON)
        .header(Header::new("x-token", other_token))
        .dispatch()
        .await;

    let status = response.status();
    let body = response.into_json::<serde_json::Value>().await.unwrap();

    // not owned is indistinguishable from missing
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["error"], "Not found");

    let response = client
        .get(format!("/files/{}", Uuid::new_v4()))
        .header(Accept::JSON)
        .header(Header::new("x-token", token))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_list_files_pagination() {
    let (client, _storage_dropper, user, token) = setup().await;
    let file_service = client.rocket().state::<Arc<FileService>>().unwrap();

    let folder = upload_folder(&client, &token, "Docs", None).await;

    for index in 0..45 {
        file_service
            .create_folder(user.id, &format!("f{}", index), Some(folder.id), false)
            .await
            .unwrap();
    }

    let mut seen = HashSet::new();
    let mut page_sizes = Vec::new();

    for page in 0..3 {
        let response = client
            .get(format!("/files?parentId={}&page={}", folder.id, page))
            .header(Accept::JSON)
            .header(Header::new("x-token", token.clone()))
            .dispatch()
            .await;

        let status = response.status();
        let files = response.into_json::<Vec<File>>().await.unwrap();

        assert_eq!(status, Status::Ok);
        page_sizes.push(files.len());

        for file in files {
            assert_eq!(file.parent_id, Some(folder.id));
            // no overlaps across pages
            assert!(seen.insert(file.id));
        }
    }

    assert_eq!(page_sizes, [20, 20, 5]);
    assert_eq!(seen.len(), 45);

    let response = client
        .get(format!("/files?parentId={}&page=3", folder.id))
        .header(Accept::JSON)
        .header(Header::new("x-token", token))
        .dispatch()
        .await;

    let files = response.into_json::<Vec<File>>().await.unwrap();
    assert!(files.is_empty());
}

#[rocket::async_test]
async fn test_list_files_with_unknown_parent_forms() {
    let (client, _storage_dropper, _user, token) = setup().await;

    let file = upload_content(&client, &token, "a.txt", "file", None, b"content").await;

    // no parentId and the "0" sentinel both select top-level files
    for query in ["/files", "/files?parentId=0"] {
        let response = client
            .get(query)
            .header(Accept::JSON)
            .header(Header::new("x-token", token.clone()))
            .dispatch()
            .await;

        let files = response.into_json::<Vec<File>>().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, file.id);
    }

    // an unparseable parent matches nothing
    let response = client
        .get("/files?parentId=not-a-uuid")
        .header(Accept::JSON)
        .header(Header::new("x-token", token))
        .dispatch()
        .await;

    let status = response.status();
    let files = response.into_json::<Vec<File>>().await.unwrap();

    assert_eq!(status, Status::Ok);
    assert!(files.is_empty());
}

#[rocket::async_test]
async fn test_publish_and_unpublish() {
    let (client, _storage_dropper, _user, token) = setup().await;

    let file = upload_content(&client, &token, "a.txt", "file", None, b"content").await;
    assert!(!file.is_public);

    for _ in 0..2 {
        // publishing twice is an idempotent success
        let response = client
            .put(format!("/files/{}/publish", file.id))
            .header(Accept::JSON)
            .header(Header::new("x-token", token.clone()))
            .dispatch()
            .await;

        let status = response.status();
        let published = response.into_json::<File>().await.unwrap();

        assert_eq!(status, Status::Ok);
        assert!(published.is_public);
    }

    let response = client
        .put(format!("/files/{}/unpublish", file.id))
        .header(Accept::JSON)
        .header(Header::new("x-token", token.clone()))
        .dispatch()
        .await;

    let status = response.status();
    let unpublished = response.into_json::<File>().await.unwrap();

    assert_eq!(status, Status::Ok);
    assert!(!unpublished.is_public);

    let response = client
        .put(format!("/files/{}/publish", Uuid::new_v4()))
        .header(Accept::JSON)
        .header(Header::new("x-token", token))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_visibility_changes_are_owner_only() {
    let (client, _storage_dropper, _user, token) = setup().await;
    let auth_service = client.rocket().state::<Arc<AuthService>>().unwrap();
    let user_service = client.rocket().state::<Arc<UserService>>().unwrap();

    let file = upload_content(&client, &token, "a.txt", "file", None, b"content").await;

    let other_user = crate::test::helpers::create_user("other", user_service).await;
    let other_token = auth_service.create_session(other_user.id).await.unwrap();

    let response = client
        .put(format!("/files/{}/publish", file.id))
        .header(Accept::JSON)
        .header(Header::new("x-token", other_token))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_file_data_access_control() {
    let (client, _storage_dropper, _user, token) = setup().await;
    let auth_service = client.rocket().state::<Arc<AuthService>>().unwrap();
    let user_service = client.rocket().state::<Arc<UserService>>().unwrap();

    let content = b"Hello, world!\n";
    let file = upload_content(&client, &token, "hello.txt", "file", None, content).await;

    let other_user = crate::test::helpers::create_user("other", user_service).await;
    let other_token = auth_service.create_session(other_user.id).await.unwrap();

    // the owner reads the private file
    let response = client
        .get(format!("/files/{}/data", file.id))
        .header(Header::new("x-token", token.clone()))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.content_type(),
        Some(ContentType::new("text", "plain"))
    );
    assert_eq!(response.into_bytes().await.unwrap(), content);

    // everyone else sees "Not found", never "Forbidden"
    let response = client
        .get(format!("/files/{}/data", file.id))
        .header(Header::new("x-token", other_token.clone()))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    let response = client
        .get(format!("/files/{}/data", file.id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    // publishing opens the content to everyone
    let response = client
        .put(format!("/files/{}/publish", file.id))
        .header(Accept::JSON)
        .header(Header::new("x-token", token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .get(format!("/files/{}/data", file.id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_bytes().await.unwrap(), content);
}

#[rocket::async_test]
async fn test_folder_data_is_an_error() {
    let (client, _storage_dropper, _user, token) = setup().await;

    let folder = upload_folder(&client, &token, "Docs", None).await;

    let response = client
        .get(format!("/files/{}/data", folder.id))
        .header(Header::new("x-token", token))
        .dispatch()
        .await;

    let status = response.status();
    let body = response.into_json::<serde_json::Value>().await.unwrap();

    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"], "A folder doesn't have content");
}

#[rocket::async_test]
async fn test_file_data_missing_blob_is_not_found() {
    let (client, _storage_dropper, _user, token) = setup().await;
    let document_store = client
        .rocket()
        .state::<Arc<dyn DocumentStore + Send + Sync>>()
        .unwrap();
    let app_config = client.rocket().state::<crate::config::AppConfig>().unwrap();

    let file = upload_content(&client, &token, "gone.txt", "file", None, b"content").await;

    // remove the blob behind the catalog's back
    let handle = document_store
        .file_by_id(file.id)
        .await
        .unwrap()
        .unwrap()
        .local_path
        .unwrap();
    std::fs::remove_file(app_config.storage_root.join(&handle)).unwrap();

    let response = client
        .get(format!("/files/{}/data", file.id))
        .header(Header::new("x-token", token))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_end_to_end_thumbnail_pipeline() {
    let (rocket, _storage_dropper) = create_test_rocket_instance().await;
    let client = Client::tracked(rocket).await.unwrap();
    let thumbnail_queue = client
        .rocket()
        .state::<Arc<dyn ThumbnailQueue + Send + Sync>>()
        .unwrap();
    let thumbnail_service = client.rocket().state::<Arc<ThumbnailService>>().unwrap();
    let document_store = client
        .rocket()
        .state::<Arc<dyn DocumentStore + Send + Sync>>()
        .unwrap();
    let app_config = client.rocket().state::<crate::config::AppConfig>().unwrap();

    // register and log in
    let response = client
        .post("/users")
        .header(Accept::JSON)
        .header(ContentType::JSON)
        .body(r#"{"email": "a@x.com", "password": "p"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);

    let response = client
        .get("/connect")
        .header(Accept::JSON)
        .header(Header::new(
            "Authorization",
            format!("Basic {}", BASE64_STANDARD.encode("a@x.com:p")),
        ))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let token = response
        .into_json::<crate::routes::user_session::dto::TokenRepr>()
        .await
        .unwrap()
        .token;

    // upload a folder and an image inside it
    let folder = upload_folder(&client, &token, "Docs", None).await;
    let image = upload_content(
        &client,
        &token,
        "photo.png",
        "image",
        Some(folder.id),
        &png_bytes(800, 600),
    )
    .await;

    assert_eq!(image.kind, FileKind::Image);
    assert_eq!(image.parent_id, Some(folder.id));

    // the pipeline completes the job
    let job = thumbnail_queue.dequeue().await.unwrap();
    assert_eq!(job.file_id, Some(image.id));

    thumbnail_service.process_job(&job).await.unwrap();

    // three sibling blobs exist on disk, each independently readable
    let handle = document_store
        .file_by_id(image.id)
        .await
        .unwrap()
        .unwrap()
        .local_path
        .unwrap();

    for width in RENDITION_WIDTHS {
        let path = app_config
            .storage_root
            .join(rendition_handle(&handle, width));
        let bytes = std::fs::read(&path).unwrap();
        let rendition = image::load_from_memory(&bytes).unwrap();
        assert_eq!(rendition.width(), width);
    }
}
