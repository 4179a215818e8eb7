use serde_json::{Value, json};
use std::collections::HashSet;

use super::payload;
use crate::graphql::{Connection, Request};
use crate::harness::Harness;
use crate::models::User;
use crate::{Result, operations};

async fn users_page(
    harness: &Harness,
    first: usize,
    after: Option<&str>,
) -> Result<Connection<User>> {
    let variables = json!({ "first": first, "after": after });
    let response = harness
        .client()
        .query::<Value>(operations::GET_USERS, Some(variables))
        .await?;
    Ok(serde_json::from_value(payload(response, "users")?)?)
}

pub async fn cursor_chain(harness: &Harness) -> Result<()> {
    let first = users_page(harness, 5, None).await?;
    ensure!(first.nodes.len() <= 5, "{} nodes for a page of 5", first.nodes.len());
    let Some(page_info) = first.page_info else {
        return Err(crate::Error::Assertion("pageInfo missing".to_owned()));
    };
    if !page_info.has_next_page {
        return Ok(());
    }

    let second = users_page(harness, 5, page_info.end_cursor.as_deref()).await?;
    ensure!(!second.nodes.is_empty(), "second page is empty");
    let seen: HashSet<u64> = first.nodes.iter().map(|user| user.id).collect();
    let overlap: Vec<u64> = second
        .nodes
        .iter()
        .map(|user| user.id)
        .filter(|id| seen.contains(id))
        .collect();
    ensure!(overlap.is_empty(), "pages share ids {:?}", overlap);
    Ok(())
}

pub async fn page_sizes(harness: &Harness) -> Result<()> {
    for size in [1, 5, 10] {
        let page = users_page(harness, size, None).await?;
        ensure!(page.nodes.len() <= size, "{} nodes for a page of {}", page.nodes.len(), size);
        ensure!(!page.nodes.is_empty(), "empty page of {}", size);
    }
    Ok(())
}

pub async fn total_count(harness: &Harness) -> Result<()> {
    let page = users_page(harness, 10, None).await?;
    ensure!(page.total_count > 0, "totalCount is {}", page.total_count);
    Ok(())
}

pub async fn batched_pages(harness: &Harness) -> Result<()> {
    let sizes = [1usize, 5, 10];
    let requests: Vec<Request> = sizes
        .iter()
        .map(|size| Request::new(operations::GET_USERS, Some(json!({ "first": size }))))
        .collect();
    let responses = harness.client().batch_query::<Value>(&requests).await?;
    ensure!(responses.len() == sizes.len(), "{} responses", responses.len());
    for (size, response) in sizes.into_iter().zip(responses) {
        let page: Connection<User> = serde_json::from_value(payload(response, "users")?)?;
        ensure!(page.nodes.len() <= size, "{} nodes for a page of {}", page.nodes.len(), size);
    }
    Ok(())
}
