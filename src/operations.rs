//! GraphQL documents exercised by the contract suite.

macro_rules! user_fields {
    () => {
        "id name email gender status"
    };
}

macro_rules! post_fields {
    () => {
        "id title body userId"
    };
}

macro_rules! todo_fields {
    () => {
        "id title status dueOn userId"
    };
}

macro_rules! comment_fields {
    () => {
        "id name email body postId"
    };
}

macro_rules! page_info_fields {
    () => {
        "hasNextPage hasPreviousPage startCursor endCursor"
    };
}

pub const GET_USERS: &str = concat!(
    "query GetUsers($first: Int, $after: String) {\n",
    "  users(first: $first, after: $after) {\n",
    "    nodes { ", user_fields!(), " }\n",
    "    pageInfo { ", page_info_fields!(), " }\n",
    "    totalCount\n",
    "  }\n",
    "}\n",
);

pub const GET_USER_BY_ID: &str = concat!(
    "query GetUser($id: ID!) {\n",
    "  user(id: $id) { ", user_fields!(), " }\n",
    "}\n",
);

pub const GET_POSTS: &str = concat!(
    "query GetPosts($first: Int, $after: String) {\n",
    "  posts(first: $first, after: $after) {\n",
    "    nodes { ", post_fields!(), " }\n",
    "    pageInfo { ", page_info_fields!(), " }\n",
    "    totalCount\n",
    "  }\n",
    "}\n",
);

pub const GET_POST_BY_ID: &str = concat!(
    "query GetPost($id: ID!) {\n",
    "  post(id: $id) {\n",
    "    ", post_fields!(), "\n",
    "    user { ", user_fields!(), " }\n",
    "  }\n",
    "}\n",
);

pub const GET_TODOS: &str = concat!(
    "query GetTodos($first: Int) {\n",
    "  todos(first: $first) {\n",
    "    nodes { ", todo_fields!(), " }\n",
    "    totalCount\n",
    "  }\n",
    "}\n",
);

pub const GET_TODO_BY_ID: &str = concat!(
    "query GetTodo($id: ID!) {\n",
    "  todo(id: $id) { ", todo_fields!(), " }\n",
    "}\n",
);

pub const GET_COMMENTS: &str = concat!(
    "query GetComments($first: Int) {\n",
    "  comments(first: $first) {\n",
    "    nodes { ", comment_fields!(), " }\n",
    "    totalCount\n",
    "  }\n",
    "}\n",
);

macro_rules! mutation {
    ($name:literal, $input:literal, $field:literal, $entity:literal, $fields:ident) => {
        concat!(
            "mutation ", $name, "($input: ", $input, "!) {\n",
            "  ", $field, "(input: $input) {\n",
            "    ", $entity, " { ", $fields!(), " }\n",
            "  }\n",
            "}\n",
        )
    };
}

pub const CREATE_USER: &str =
    mutation!("CreateUser", "createUserInput", "createUser", "user", user_fields);
pub const UPDATE_USER: &str =
    mutation!("UpdateUser", "updateUserInput", "updateUser", "user", user_fields);
pub const DELETE_USER: &str =
    mutation!("DeleteUser", "deleteUserInput", "deleteUser", "user", user_fields);

pub const CREATE_POST: &str =
    mutation!("CreatePost", "createPostInput", "createPost", "post", post_fields);
pub const UPDATE_POST: &str =
    mutation!("UpdatePost", "updatePostInput", "updatePost", "post", post_fields);
pub const DELETE_POST: &str =
    mutation!("DeletePost", "deletePostInput", "deletePost", "post", post_fields);

pub const CREATE_TODO: &str =
    mutation!("CreateTodo", "createTodoInput", "createTodo", "todo", todo_fields);
pub const UPDATE_TODO: &str =
    mutation!("UpdateTodo", "updateTodoInput", "updateTodo", "todo", todo_fields);
pub const DELETE_TODO: &str =
    mutation!("DeleteTodo", "deleteTodoInput", "deleteTodo", "todo", todo_fields);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_take_a_single_input() {
        assert_eq!(
            CREATE_USER,
            "mutation CreateUser($input: createUserInput!) {\n  createUser(input: $input) {\n    user { id name email gender status }\n  }\n}\n"
        );
        for document in [UPDATE_POST, DELETE_TODO] {
            assert_eq!(document.matches("$input").count(), 2);
        }
    }

    #[test]
    fn connection_queries_request_page_info() {
        assert!(GET_USERS.contains("pageInfo { hasNextPage hasPreviousPage startCursor endCursor }"));
        assert!(GET_USERS.contains("users(first: $first, after: $after)"));
        assert!(!GET_TODOS.contains("pageInfo"));
    }
}
