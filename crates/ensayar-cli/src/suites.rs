//! The built-in GamesPlay suite.
//!
//! Fourteen scenarios covering authentication, navigation-bar state,
//! CRUD on games, and the home page. Cases run in declaration order:
//! registration produces the `user` fixture every later authenticated
//! case consumes, creation produces the `game_title` fixture, and the
//! edit case re-produces it under the new name so the delete case looks
//! up the record the server actually holds.

use ensayar::{
    assert_json_fields, assert_ok, EnsayarResult, ResponsePredicate, ScenarioContext, Selector,
    Suite, SuiteConfig, TestCase, UserIdentity,
};
use serde_json::json;
use uuid::Uuid;

/// Fixture name for the registered identity
const USER: &str = "user";

/// Fixture name for the created game's current title
const GAME_TITLE: &str = "game_title";

fn submit() -> Selector {
    Selector::css("[type=\"submit\"]")
}

fn nav_link(text: &str) -> Selector {
    Selector::css_with_text("nav a", text)
}

fn details_button(title: &str) -> Selector {
    Selector::within_text(".allGames .allGames-info", title, ".details-button")
}

/// Log in as the registered user and wait for the session to show in the
/// navbar. Shared arranging step for every authenticated case.
async fn log_in(ctx: &mut ScenarioContext) -> EnsayarResult<()> {
    let home = ctx.url("/");
    ctx.driver.navigate(&home).await?;
    ctx.driver.click(&Selector::text("Login")).await?;
    ctx.driver.wait_for_selector(&Selector::css("form")).await?;

    let user: UserIdentity = ctx.fixtures.get(USER)?;
    ctx.driver.fill(&Selector::css("#email"), &user.email).await?;
    ctx.driver
        .fill(&Selector::css("#login-password"), &user.password)
        .await?;
    ctx.driver.click(&submit()).await?;
    ctx.driver.wait_for_text("Logout").await?;
    Ok(())
}

/// Build the full suite
#[must_use]
pub fn gamesplay_suite(config: SuiteConfig) -> Suite {
    Suite::new("gamesplay e2e", config)
        .case(register_makes_correct_api_calls())
        .case(register_rejects_empty_fields())
        .case(login_makes_correct_api_calls())
        .case(login_rejects_empty_fields())
        .case(logout_makes_correct_api_call())
        .case(logged_in_navbar())
        .case(guest_navbar())
        .case(create_rejects_empty_fields())
        .case(create_succeeds())
        .case(owner_sees_edit_and_delete())
        .case(non_owner_sees_no_edit_or_delete())
        .case(edit_succeeds_for_owner())
        .case(delete_succeeds())
        .case(home_page_view())
}

fn register_makes_correct_api_calls() -> TestCase {
    TestCase::new("register makes correct api calls")
        .produces(USER)
        .arrange(|ctx| {
            Box::pin(async move {
                let home = ctx.url("/");
                ctx.driver.navigate(&home).await
            })
        })
        .act(|ctx| {
            Box::pin(async move {
                ctx.driver.click(&Selector::text("Register")).await?;
                ctx.driver.wait_for_selector(&Selector::css("form")).await?;

                // Randomized per run so reruns never collide on the server.
                let suffix = Uuid::new_v4().simple().to_string();
                let user = UserIdentity::new(format!("abv{}@abv.bg", &suffix[..8]), "123456");

                ctx.driver.fill(&Selector::css("#email"), &user.email).await?;
                ctx.driver
                    .fill(&Selector::css("#register-password"), &user.password)
                    .await?;
                ctx.driver
                    .fill(&Selector::css("#confirm-password"), &user.confirm_password)
                    .await?;

                ctx.correlate_click(ResponsePredicate::new("/users/register", 200), &submit())
                    .await?;
                ctx.fixtures.put(USER, &user)
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                let user: UserIdentity = ctx.fixtures.get(USER)?;
                let response = ctx.last_response()?;
                assert_ok(response)?;
                let payload = response.json()?;
                assert_json_fields(
                    &payload,
                    &[
                        ("email", json!(user.email)),
                        ("password", json!(user.password)),
                    ],
                )
            })
        })
}

fn register_rejects_empty_fields() -> TestCase {
    TestCase::new("register not working with empty fields")
        .arrange(|ctx| {
            Box::pin(async move {
                let home = ctx.url("/");
                ctx.driver.navigate(&home).await
            })
        })
        .act(|ctx| {
            Box::pin(async move {
                ctx.driver.click(&Selector::text("Register")).await?;
                ctx.driver.wait_for_selector(&Selector::css("form")).await?;
                ctx.driver.click(&submit()).await
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                let expected = ctx.url("/register");
                ctx.dom.url_equals(&expected).await
            })
        })
}

fn login_makes_correct_api_calls() -> TestCase {
    TestCase::new("login makes correct api calls")
        .consumes(USER)
        .arrange(|ctx| {
            Box::pin(async move {
                let home = ctx.url("/");
                ctx.driver.navigate(&home).await?;
                ctx.driver.click(&Selector::text("Login")).await?;
                ctx.driver.wait_for_selector(&Selector::css("form")).await?;
                Ok(())
            })
        })
        .act(|ctx| {
            Box::pin(async move {
                let user: UserIdentity = ctx.fixtures.get(USER)?;
                ctx.driver.fill(&Selector::css("#email"), &user.email).await?;
                ctx.driver
                    .fill(&Selector::css("#login-password"), &user.password)
                    .await?;
                ctx.correlate_click(ResponsePredicate::new("/users/login", 200), &submit())
                    .await?;
                Ok(())
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                let user: UserIdentity = ctx.fixtures.get(USER)?;
                let response = ctx.last_response()?;
                assert_ok(response)?;
                let payload = response.json()?;
                assert_json_fields(
                    &payload,
                    &[
                        ("email", json!(user.email)),
                        ("password", json!(user.password)),
                    ],
                )
            })
        })
}

fn login_rejects_empty_fields() -> TestCase {
    TestCase::new("login fails with empty input fields")
        .arrange(|ctx| {
            Box::pin(async move {
                let home = ctx.url("/");
                ctx.driver.navigate(&home).await?;
                ctx.driver.click(&Selector::text("Login")).await?;
                ctx.driver.wait_for_selector(&Selector::css("form")).await?;
                Ok(())
            })
        })
        .act(|ctx| Box::pin(async move { ctx.driver.click(&submit()).await }))
        .assert(|ctx| {
            Box::pin(async move {
                let expected = ctx.url("/login");
                ctx.dom.url_equals(&expected).await
            })
        })
}

fn logout_makes_correct_api_call() -> TestCase {
    TestCase::new("logout makes correct api call")
        .consumes(USER)
        .arrange(|ctx| Box::pin(log_in(ctx)))
        .act(|ctx| {
            Box::pin(async move {
                ctx.correlate_click(
                    ResponsePredicate::new("/users/logout", 204),
                    &Selector::text("Logout"),
                )
                .await?;
                ctx.driver.wait_for_text("Login").await?;
                Ok(())
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                let response = ctx.last_response()?;
                assert_ok(response)?;
                let expected = ctx.url("/");
                ctx.dom.url_equals(&expected).await
            })
        })
}

fn logged_in_navbar() -> TestCase {
    TestCase::new("logged user sees correct nav buttons")
        .consumes(USER)
        .arrange(|ctx| Box::pin(log_in(ctx)))
        .assert(|ctx| {
            Box::pin(async move {
                ctx.dom.visible(&nav_link("All games")).await?;
                ctx.dom.visible(&nav_link("Create Game")).await?;
                ctx.dom.visible(&nav_link("Logout")).await?;
                ctx.dom.hidden(&nav_link("Login")).await?;
                ctx.dom.hidden(&nav_link("Register")).await
            })
        })
}

fn guest_navbar() -> TestCase {
    TestCase::new("guest user sees correct nav buttons")
        .arrange(|ctx| {
            Box::pin(async move {
                let home = ctx.url("/");
                ctx.driver.navigate(&home).await
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                ctx.dom.visible(&nav_link("All games")).await?;
                ctx.dom.visible(&nav_link("Login")).await?;
                ctx.dom.visible(&nav_link("Register")).await?;
                ctx.dom.hidden(&nav_link("Create Game")).await?;
                ctx.dom.hidden(&nav_link("Logout")).await
            })
        })
}

fn create_rejects_empty_fields() -> TestCase {
    TestCase::new("create fails with empty fields")
        .consumes(USER)
        .arrange(|ctx| {
            Box::pin(async move {
                log_in(ctx).await?;
                ctx.driver.click(&Selector::text("Create Game")).await?;
                ctx.driver.wait_for_selector(&Selector::css("form")).await?;
                Ok(())
            })
        })
        .act(|ctx| Box::pin(async move { ctx.driver.click(&submit()).await }))
        .assert(|ctx| {
            Box::pin(async move {
                let expected = ctx.url("/create");
                ctx.dom.url_equals(&expected).await
            })
        })
}

fn create_succeeds() -> TestCase {
    TestCase::new("create succeeds with valid input")
        .consumes(USER)
        .produces(GAME_TITLE)
        .arrange(|ctx| {
            Box::pin(async move {
                log_in(ctx).await?;
                ctx.driver.click(&Selector::text("Create Game")).await?;
                ctx.driver.wait_for_selector(&Selector::css("form")).await?;
                Ok(())
            })
        })
        .act(|ctx| {
            Box::pin(async move {
                // One record both fills the form and backs the assertions,
                // so the stored title and the asserted title cannot drift.
                let title = "Random title";
                ctx.driver.fill(&Selector::css("[name=\"title\"]"), title).await?;
                ctx.driver
                    .fill(&Selector::css("[name=\"category\"]"), "Random category")
                    .await?;
                ctx.driver
                    .fill(&Selector::css("[name=\"maxLevel\"]"), "777")
                    .await?;
                ctx.driver
                    .fill(
                        &Selector::css("[name=\"imageUrl\"]"),
                        "https://jpeg.org/images/jpeg-home.jpg",
                    )
                    .await?;
                ctx.driver
                    .fill(&Selector::css("[name=\"summary\"]"), "Some test summary")
                    .await?;

                ctx.correlate_click(ResponsePredicate::new("/data/games", 200), &submit())
                    .await?;
                ctx.fixtures.put(GAME_TITLE, &title)
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                let title: String = ctx.fixtures.get(GAME_TITLE)?;
                let response = ctx.last_response()?;
                assert_ok(response)?;
                let payload = response.json()?;
                assert_json_fields(
                    &payload,
                    &[
                        ("title", json!(title)),
                        ("category", json!("Random category")),
                        ("maxLevel", json!("777")),
                        ("summary", json!("Some test summary")),
                    ],
                )
            })
        })
}

fn owner_sees_edit_and_delete() -> TestCase {
    TestCase::new("owner sees edit and delete buttons")
        .consumes(USER)
        .consumes(GAME_TITLE)
        .arrange(|ctx| {
            Box::pin(async move {
                log_in(ctx).await?;
                let catalog = ctx.url("/catalog");
                ctx.driver.navigate(&catalog).await
            })
        })
        .act(|ctx| {
            Box::pin(async move {
                let title: String = ctx.fixtures.get(GAME_TITLE)?;
                ctx.driver.click(&details_button(&title)).await
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                ctx.dom.visible(&Selector::text("Delete")).await?;
                ctx.dom.visible(&Selector::text("Edit")).await
            })
        })
}

fn non_owner_sees_no_edit_or_delete() -> TestCase {
    TestCase::new("non-owner sees no edit or delete buttons")
        .consumes(USER)
        .arrange(|ctx| {
            Box::pin(async move {
                log_in(ctx).await?;
                let catalog = ctx.url("/catalog");
                ctx.driver.navigate(&catalog).await
            })
        })
        .act(|ctx| {
            Box::pin(async move {
                // A seeded record owned by someone else.
                ctx.driver.click(&details_button("Zombie Lang")).await
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                ctx.dom.hidden(&Selector::text("Delete")).await?;
                ctx.dom.hidden(&Selector::text("Edit")).await
            })
        })
}

fn edit_succeeds_for_owner() -> TestCase {
    TestCase::new("edit succeeds for the game owner")
        .consumes(USER)
        .consumes(GAME_TITLE)
        .produces(GAME_TITLE)
        .arrange(|ctx| {
            Box::pin(async move {
                log_in(ctx).await?;
                let catalog = ctx.url("/catalog");
                ctx.driver.navigate(&catalog).await?;
                let title: String = ctx.fixtures.get(GAME_TITLE)?;
                ctx.driver.click(&details_button(&title)).await?;
                ctx.driver.click(&Selector::text("Edit")).await?;
                ctx.driver.wait_for_selector(&Selector::css("form")).await?;
                Ok(())
            })
        })
        .act(|ctx| {
            Box::pin(async move {
                let new_title = "Edited random title";
                ctx.driver
                    .fill(&Selector::css("[name=\"title\"]"), new_title)
                    .await?;
                ctx.correlate_click(ResponsePredicate::new("/data/games", 200), &submit())
                    .await?;
                // Later cases locate the record by its current name.
                ctx.fixtures.put(GAME_TITLE, &new_title)
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                let title: String = ctx.fixtures.get(GAME_TITLE)?;
                let response = ctx.last_response()?;
                assert_ok(response)?;
                let payload = response.json()?;
                assert_json_fields(&payload, &[("title", json!(title))])
            })
        })
}

fn delete_succeeds() -> TestCase {
    TestCase::new("delete succeeds")
        .consumes(USER)
        .consumes(GAME_TITLE)
        .arrange(|ctx| {
            Box::pin(async move {
                log_in(ctx).await?;
                let catalog = ctx.url("/catalog");
                ctx.driver.navigate(&catalog).await?;
                let title: String = ctx.fixtures.get(GAME_TITLE)?;
                ctx.driver.click(&details_button(&title)).await?;
                ctx.driver.click(&Selector::text("Delete")).await?;
                ctx.driver.wait_for_selector(&Selector::css("form")).await?;
                Ok(())
            })
        })
        .act(|ctx| {
            Box::pin(async move {
                ctx.correlate_click(
                    ResponsePredicate::new("/data/games", 200),
                    &Selector::text("Delete"),
                )
                .await?;
                Ok(())
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                let response = ctx.last_response()?;
                assert_ok(response)
            })
        })
}

fn home_page_view() -> TestCase {
    TestCase::new("home page shows the latest games")
        .arrange(|ctx| {
            Box::pin(async move {
                let home = ctx.url("/");
                ctx.driver.navigate(&home).await
            })
        })
        .assert(|ctx| {
            Box::pin(async move {
                ctx.dom
                    .text_equals(&Selector::css(".welcome-message h2"), "ALL new games are")
                    .await?;
                ctx.dom
                    .text_equals(&Selector::css(".welcome-message h3"), "Only in GamesPlay")
                    .await?;
                ctx.dom
                    .text_equals(&Selector::css("#home-page h1"), "Latest Games")
                    .await?;
                ctx.dom
                    .count_at_least(&Selector::css("#home-page .game"), 3)
                    .await
            })
        })
}
