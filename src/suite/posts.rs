use serde_json::{Value, json};

use super::{entity, ensure_valid, payload};
use crate::factory::{self, PostOverrides, UserOverrides};
use crate::fixture::{self, with_post, with_user};
use crate::graphql::Connection;
use crate::harness::Harness;
use crate::models::{Comment, Post, PostWithUser, UpdatePostInput};
use crate::schema::{comment_schema, connection_schema, post_schema};
use crate::{Result, operations};

pub async fn fetch_list(harness: &Harness) -> Result<()> {
    let response = harness
        .client()
        .query::<Value>(operations::GET_POSTS, Some(json!({ "first": 10 })))
        .await?;
    ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
    let posts = payload(response, "posts")?;
    ensure_valid(harness, &connection_schema(post_schema()), &posts)?;
    let posts: Connection<Post> = serde_json::from_value(posts)?;
    ensure!(posts.total_count > 0, "totalCount is {}", posts.total_count);
    Ok(())
}

pub async fn create(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |user| async move {
        let user_id = user.entity.id;
        with_post(client, user_id, PostOverrides::default(), |created| async move {
            let (input, post) = (created.input, created.entity);
            ensure!(post.title == input.title, "title {:?} != {:?}", post.title, input.title);
            ensure!(post.body == input.body, "body {:?} != {:?}", post.body, input.body);
            ensure!(post.user_id == user_id, "post belongs to {}", post.user_id);
            ensure_valid(harness, &post_schema(), &serde_json::to_value(&post)?)
        })
        .await
    })
    .await
}

pub async fn fetch_with_user(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |user| async move {
        let user_id = user.entity.id;
        with_post(client, user_id, PostOverrides::default(), |created| async move {
            let response = client
                .query::<Value>(
                    operations::GET_POST_BY_ID,
                    Some(json!({ "id": created.entity.id })),
                )
                .await?;
            ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
            let post: PostWithUser = serde_json::from_value(payload(response, "post")?)?;
            ensure!(post.post.id == created.entity.id, "fetched post {}", post.post.id);
            let author = post.user.map(|user| user.id);
            ensure!(author == Some(user_id), "author is {:?}", author);
            Ok(())
        })
        .await
    })
    .await
}

pub async fn update(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |user| async move {
        with_post(client, user.entity.id, PostOverrides::default(), |created| async move {
            let title = format!("Updated Title {}", factory::unique_stamp());
            let input = UpdatePostInput {
                id: created.entity.id,
                title: Some(title.clone()),
                ..Default::default()
            };
            let response = client
                .mutation::<Value>(operations::UPDATE_POST, Some(json!({ "input": input })))
                .await?;
            ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
            let post: Post = serde_json::from_value(entity(payload(response, "updatePost")?, "post")?)?;
            ensure!(post.title == title, "title is {:?}", post.title);
            Ok(())
        })
        .await
    })
    .await
}

pub async fn delete(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |user| async move {
        let input = factory::post_input(user.entity.id, PostOverrides::default());
        let created = fixture::provision::<Post>(client, input).await?;
        let Some(post) = created.entity else {
            return Err(crate::Error::MissingEntity("post"));
        };
        let response = fixture::delete::<Post>(client, post.id).await?;
        ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
        Ok(())
    })
    .await
}

pub async fn fetch_comments(harness: &Harness) -> Result<()> {
    let response = harness
        .client()
        .query::<Value>(operations::GET_COMMENTS, Some(json!({ "first": 10 })))
        .await?;
    ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
    let comments = payload(response, "comments")?;
    if let Some(nodes) = comments.get("nodes").and_then(Value::as_array) {
        for node in nodes {
            ensure_valid(harness, &comment_schema(), node)?;
        }
    }
    let comments: Connection<Comment> = serde_json::from_value(comments)?;
    ensure!(
        comments.nodes.len() <= 10,
        "{} comments for a page of 10",
        comments.nodes.len()
    );
    Ok(())
}
