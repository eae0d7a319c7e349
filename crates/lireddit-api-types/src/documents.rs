//! GraphQL documents sent by the command-line client.

pub const REGULAR_USER_FIELDS: &str = "id username email createdAt updatedAt";

pub const POST_SNIPPET_FIELDS: &str = "id title textSnippet points voteStatus creatorId createdAt updatedAt creator { id username }";

pub const ME_QUERY: &str = "query Me { me { id username email createdAt updatedAt } }";

pub const POSTS_QUERY: &str = "query Posts($limit: Int!, $cursor: String) { posts(limit: $limit, cursor: $cursor) { hasMore posts { id title textSnippet points voteStatus creatorId createdAt updatedAt creator { id username } } } }";

pub const POST_QUERY: &str = "query Post($id: Int!) { post(id: $id) { id title text textSnippet points voteStatus creatorId createdAt updatedAt creator { id username } } }";

pub const LOGIN_MUTATION: &str = "mutation Login($usernameOrEmail: String!, $password: String!) { login(usernameOrEmail: $usernameOrEmail, password: $password) { errors { field message } users { id username email createdAt updatedAt } } }";

pub const REGISTER_MUTATION: &str = "mutation Register($options: UsernamePasswordInput!) { register(options: $options) { errors { field message } users { id username email createdAt updatedAt } } }";

pub const CHANGE_PASSWORD_MUTATION: &str = "mutation ChangePassword($token: String!, $newPassword: String!) { changePassword(token: $token, newPassword: $newPassword) { errors { field message } users { id username email createdAt updatedAt } } }";

pub const FORGOT_PASSWORD_MUTATION: &str =
    "mutation ForgotPassword($email: String!) { forgotPassword(email: $email) }";

pub const LOGOUT_MUTATION: &str = "mutation Logout { logout }";

pub const VOTE_MUTATION: &str =
    "mutation Vote($postId: Int!, $value: Int!) { vote(postId: $postId, value: $value) }";

pub const CREATE_POST_MUTATION: &str = "mutation CreatePost($input: PostInput!) { createPost(input: $input) { id title textSnippet points voteStatus creatorId createdAt updatedAt creator { id username } } }";

pub const DELETE_POST_MUTATION: &str = "mutation DeletePost($id: Int!) { deletePost(id: $id) }";
