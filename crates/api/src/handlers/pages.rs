//! Browser-facing pages served outside the JSON API.

use axum::response::Html;

/// Landing page for GoTrue password recovery links.
///
/// GoTrue redirects here (`AUTH_RECOVERY_REDIRECT_URL`) with `access_token`
/// and `type` in the URL fragment. The fragment never reaches the server, so
/// the page reads it in the browser and posts the new password to
/// `POST /auth/reset-password`.
const RESET_PASSWORD_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8" />
  <title>Reset Password</title>
</head>
<body>
  <h2>Reset Password</h2>

  <form id="resetForm">
    <input type="password" id="password" placeholder="New password" minlength="8" required />
    <br /><br />
    <button type="submit">Reset Password</button>
  </form>

  <p id="status"></p>

  <script>
    const status = document.getElementById("status");
    const params = new URLSearchParams(window.location.hash.substring(1));
    const accessToken = params.get("access_token");
    const linkType = params.get("type");

    if (!accessToken || linkType !== "recovery") {
      status.innerText = "Invalid or missing recovery token.";
      document.getElementById("resetForm").hidden = true;
    }

    document.getElementById("resetForm").addEventListener("submit", async (event) => {
      event.preventDefault();

      const res = await fetch("/auth/reset-password", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({
          access_token: accessToken,
          password: document.getElementById("password").value,
          type: linkType,
        }),
      });

      const body = await res.json();
      status.innerText = res.ok ? body.data.message : body.error;
    });
  </script>
</body>
</html>
"#;

/// GET /reset-password
pub async fn reset_password_page() -> Html<&'static str> {
    Html(RESET_PASSWORD_PAGE)
}
