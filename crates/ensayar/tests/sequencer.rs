//! End-to-end sequencer runs over the mock host.
//!
//! These exercise the suite runner the way the built-in GamesPlay suite
//! uses it: per-case isolated sessions, correlated submits, fixtures
//! threaded between cases, and loud failures when a stored fixture no
//! longer matches the DOM.

use std::sync::Arc;

use ensayar::mock::{ClickEffect, MockPage, MockSessionProvider, StaticBodies};
use ensayar::{
    assert_json_fields, assert_ok, CaseStatus, ElementProbe, ErrorCategory, ResponseEvent,
    ResponsePredicate, Selector, Suite, SuiteConfig, TestCase, UserIdentity,
};

fn config() -> SuiteConfig {
    SuiteConfig::new("http://h")
        .with_action_timeout(300)
        .with_assertion_timeout(200)
        .with_response_timeout(400)
        .with_poll_interval(10)
}

fn submit() -> Selector {
    Selector::css("[type=\"submit\"]")
}

/// A landing page whose Register link reveals the registration form, and
/// whose submit answers like the real API.
fn registration_page(tap: ensayar::NetworkTap) -> MockPage {
    let page = MockPage::new("http://h/").with_tap(tap);
    page.insert(&Selector::text("Register"), ElementProbe::visible("Register"));
    page.on_click(
        &Selector::text("Register"),
        vec![
            ClickEffect::Navigate("http://h/register".to_string()),
            ClickEffect::Show(Selector::css("form"), ElementProbe::visible("")),
            ClickEffect::Show(Selector::css("#email"), ElementProbe::visible("")),
            ClickEffect::Show(Selector::css("#register-password"), ElementProbe::visible("")),
            ClickEffect::Show(Selector::css("#confirm-password"), ElementProbe::visible("")),
            ClickEffect::Show(submit(), ElementProbe::visible("")),
        ],
    );
    page.on_click(
        &submit(),
        vec![
            ClickEffect::Publish(ResponseEvent::new("reg-1", "http://h/users/register", 200)),
            ClickEffect::Navigate("http://h/".to_string()),
        ],
    );
    page
}

#[tokio::test]
async fn registration_scenario_end_to_end() {
    let bodies = Arc::new(StaticBodies::new());
    bodies.insert(
        "reg-1",
        r#"{"email":"abv1234@abv.bg","password":"123456"}"#,
    );

    let provider = MockSessionProvider::new(|_, tap| registration_page(tap))
        .with_body_fetcher(bodies.clone());

    let suite = Suite::new("registration", config()).case(
        TestCase::new("register makes correct api calls")
            .produces("user")
            .arrange(|ctx| {
                Box::pin(async move {
                    let url = ctx.url("/");
                    ctx.driver.navigate(&url).await
                })
            })
            .act(|ctx| {
                Box::pin(async move {
                    ctx.driver.click(&Selector::text("Register")).await?;
                    ctx.driver.wait_for_selector(&Selector::css("form")).await?;

                    let user = UserIdentity::new("abv1234@abv.bg", "123456");
                    ctx.driver.fill(&Selector::css("#email"), &user.email).await?;
                    ctx.driver
                        .fill(&Selector::css("#register-password"), &user.password)
                        .await?;
                    ctx.driver
                        .fill(&Selector::css("#confirm-password"), &user.confirm_password)
                        .await?;

                    ctx.correlate_click(
                        ResponsePredicate::new("/users/register", 200),
                        &Selector::css("[type=\"submit\"]"),
                    )
                    .await?;
                    ctx.fixtures.put("user", &user)
                })
            })
            .assert(|ctx| {
                Box::pin(async move {
                    let user: UserIdentity = ctx.fixtures.get("user")?;
                    let response = ctx.last_response()?;
                    assert_ok(response)?;
                    let json = response.json()?;
                    assert_json_fields(
                        &json,
                        &[
                            ("email", serde_json::json!(user.email)),
                            ("password", serde_json::json!(user.password)),
                        ],
                    )
                })
            }),
    );

    let report = suite.run(&provider).await.unwrap();
    assert!(report.all_passed(), "{:?}", report.failures());
}

#[tokio::test]
async fn empty_submit_leaves_url_pinned() {
    // Submitting with no fields filled: the page scripts no navigation
    // for the submit click, like a client-side rejection.
    let provider = MockSessionProvider::new(|_, tap| {
        let page = MockPage::new("http://h/").with_tap(tap);
        page.insert(&Selector::text("Register"), ElementProbe::visible("Register"));
        page.on_click(
            &Selector::text("Register"),
            vec![
                ClickEffect::Navigate("http://h/register".to_string()),
                ClickEffect::Show(submit(), ElementProbe::visible("")),
            ],
        );
        page
    });

    let suite = Suite::new("rejection", config()).case(
        TestCase::new("register not working with empty fields")
            .arrange(|ctx| {
                Box::pin(async move {
                    let url = ctx.url("/");
                    ctx.driver.navigate(&url).await
                })
            })
            .act(|ctx| {
                Box::pin(async move {
                    ctx.driver.click(&Selector::text("Register")).await?;
                    ctx.driver.click(&submit()).await
                })
            })
            .assert(|ctx| {
                Box::pin(async move {
                    let expected = ctx.url("/register");
                    ctx.dom.url_equals(&expected).await
                })
            }),
    );

    let report = suite.run(&provider).await.unwrap();
    assert!(report.all_passed(), "{:?}", report.failures());
}

#[tokio::test]
async fn stale_fixture_title_fails_with_element_not_found() {
    // The creating case stores one title; the catalog page only knows the
    // card under a different title. The later lookup must fail loudly
    // with ElementNotFound, never silently pass.
    let provider = MockSessionProvider::new(|_, tap| {
        let page = MockPage::new("http://h/catalog").with_tap(tap);
        page.insert(
            &Selector::within_text(".allGames .allGames-info", "Edited random title", ".details-button"),
            ElementProbe::visible("Details"),
        );
        page
    });

    let suite = Suite::new("stale title", config())
        .case(
            TestCase::new("create stores a title")
                .produces("game_title")
                .act(|ctx| {
                    Box::pin(async move { ctx.fixtures.put("game_title", &"Random title") })
                }),
        )
        .case(
            TestCase::new("edit locates by stored title")
                .consumes("game_title")
                .act(|ctx| {
                    Box::pin(async move {
                        let title: String = ctx.fixtures.get("game_title")?;
                        ctx.driver
                            .click(&Selector::within_text(
                                ".allGames .allGames-info",
                                title,
                                ".details-button",
                            ))
                            .await
                    })
                }),
        );

    let report = suite.run(&provider).await.unwrap();
    assert!(report.cases[0].is_passed());
    match &report.cases[1].status {
        CaseStatus::Failed { category, message } => {
            assert_eq!(*category, ErrorCategory::ElementNotFound);
            assert!(message.contains("Random title"));
        }
        CaseStatus::Passed => panic!("stale title lookup must not pass"),
    }
}

#[tokio::test]
async fn edited_title_is_threaded_to_the_next_case() {
    // The edit case re-produces the title fixture; the delete case finds
    // the card under the edited name because it reads the store, not a
    // literal.
    let provider = MockSessionProvider::new(|_, tap| {
        let page = MockPage::new("http://h/catalog").with_tap(tap);
        page.insert(
            &Selector::within_text(".allGames .allGames-info", "Edited random title", ".details-button"),
            ElementProbe::visible("Details"),
        );
        page
    });

    let suite = Suite::new("rename threading", config())
        .case(
            TestCase::new("edit renames the game")
                .produces("game_title")
                .act(|ctx| {
                    Box::pin(async move {
                        ctx.fixtures.put("game_title", &"Edited random title")
                    })
                }),
        )
        .case(
            TestCase::new("delete locates the renamed game")
                .consumes("game_title")
                .act(|ctx| {
                    Box::pin(async move {
                        let title: String = ctx.fixtures.get("game_title")?;
                        ctx.driver
                            .click(&Selector::within_text(
                                ".allGames .allGames-info",
                                title,
                                ".details-button",
                            ))
                            .await
                    })
                }),
        );

    let report = suite.run(&provider).await.unwrap();
    assert!(report.all_passed(), "{:?}", report.failures());
}
