use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use lurnix::auth::{UserClaims, generate_token};
use lurnix::model::MemoryGateway;
use lurnix::model::entity::{
    Course, CourseSlide, ExamConfig, ExamOption, ExamQuestion, ExerciseOption, ExerciseQuestion,
    SlideKind,
};
use lurnix::web::middlewares::AUTH_TOKEN;
use lurnix::{Config, build_server_with_gateway};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_cookies::Cookie;
use uuid::Uuid;

/// Everything the flows need to address the seeded course.
pub struct DemoCourse {
    pub course_id: Uuid,
    pub exam_id: Uuid,
    pub exam_order: i32,
    pub question_count: usize,
}

fn slide(course_id: Uuid, order: i32, kind: SlideKind, title: &str) -> CourseSlide {
    CourseSlide::new(
        Uuid::new_v4(),
        course_id,
        order,
        kind,
        title.to_string(),
        Some(format!("body of {title}")),
        None,
        None,
        None,
    )
}

/// A small but complete course: one intro slide, four gated content slides
/// (the third is an exercise) and a final exam of five questions. Shuffling
/// is off so flows can answer by index.
pub async fn seed_demo_course(gateway: &MemoryGateway) -> DemoCourse {
    let course_id = Uuid::new_v4();
    let exam_id = Uuid::new_v4();

    gateway
        .insert_course(Course::new(
            course_id,
            "RUST101".to_string(),
            "Intro to Rust".to_string(),
        ))
        .await;

    gateway
        .insert_slide(slide(course_id, 0, SlideKind::Content, "Welcome"))
        .await;
    gateway
        .insert_slide(slide(course_id, 1, SlideKind::Content, "Ownership"))
        .await;
    gateway
        .insert_slide(slide(course_id, 2, SlideKind::Video, "Borrowing"))
        .await;

    let exercise = slide(course_id, 3, SlideKind::Exercise, "Iterators quiz");
    let exercise_id = exercise.id();
    gateway.insert_slide(exercise).await;
    gateway
        .insert_exercise_question(ExerciseQuestion::new(
            Uuid::new_v4(),
            exercise_id,
            "What does `map` return?".to_string(),
            vec![
                ExerciseOption {
                    text: "A borrow checker error".to_string(),
                    is_correct: false,
                },
                ExerciseOption {
                    text: "An iterator adapter".to_string(),
                    is_correct: true,
                },
                ExerciseOption {
                    text: "A collected Vec".to_string(),
                    is_correct: false,
                },
            ],
            Some("`map` is lazy; it wraps the iterator in an adapter.".to_string()),
        ))
        .await;

    gateway
        .insert_slide(slide(course_id, 4, SlideKind::Content, "Error handling"))
        .await;

    gateway
        .insert_slide(CourseSlide::new(
            Uuid::new_v4(),
            course_id,
            5,
            SlideKind::Exam,
            "Final exam".to_string(),
            None,
            None,
            None,
            Some(exam_id),
        ))
        .await;

    let question_count = 5;
    let questions = (0..question_count)
        .map(|i| {
            ExamQuestion::new(
                Uuid::new_v4(),
                exam_id,
                i as i32 + 1,
                format!("exam question {i}"),
                vec![
                    ExamOption {
                        text: "right answer".to_string(),
                        is_correct: true,
                    },
                    ExamOption {
                        text: "wrong answer".to_string(),
                        is_correct: false,
                    },
                    ExamOption {
                        text: "also wrong".to_string(),
                        is_correct: false,
                    },
                ],
            )
        })
        .collect();
    gateway
        .insert_exam(
            ExamConfig::new(exam_id, Some(80), Some(30), false, false),
            questions,
        )
        .await;

    DemoCourse {
        course_id,
        exam_id,
        exam_order: 5,
        question_count,
    }
}

pub async fn setup_server(gateway: Arc<MemoryGateway>) -> TestServer {
    let server = build_server_with_gateway(gateway).await.unwrap().1;
    TestServer::new(server).unwrap()
}

/// Mints an SID cookie the way the external auth provider would and pins it
/// to the server's cookie jar.
pub async fn login(server: &mut TestServer, user_id: Uuid, role: &str) {
    let config = Config::get_or_init(true).await;
    let claims = UserClaims {
        sub: user_id.to_string(),
        role: role.to_string(),
        name: "Test Learner".to_string(),
        email: "learner@example.com".to_string(),
        exp: Utc::now().timestamp() + 3600,
    };
    let token = generate_token(claims, config.app().jwt()).expect("token generation failed");

    server.clear_cookies();
    server.add_cookie(Cookie::new(AUTH_TOKEN, token));
}

#[derive(Debug)]
pub struct FlowContext {
    pub store: HashMap<&'static str, Value>, // a way to pass data between steps
}

impl FlowContext {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
        }
    }

    pub fn store(&mut self, key: &'static str, val: Value) {
        self.store.insert(key, val);
    }

    pub fn get(&self, key: &str) -> &Value {
        self.store.get(key).expect("missing store key")
    }

    pub fn get_json<'de, T>(&self, key: &str) -> T
    where
        T: DeserializeOwned,
    {
        let obj = self.get(key);
        let de: T = serde_json::from_value(obj.clone()).expect("Invalid json format");
        de
    }
}

pub struct Action {
    #[allow(unused)]
    pub name: &'static str,
    pub method: &'static str,
    pub path: String,
    pub dyn_path: Option<Box<dyn Fn(&FlowContext) -> String + Send + Sync>>,
    pub body: Option<Value>,
    pub dyn_body: Option<Box<dyn Fn(&FlowContext) -> Value + Send + Sync>>,
    pub expect: StatusCode,
    pub query_params: Vec<(String, String)>,
    pub body_asserts: Vec<Box<dyn Fn(&str) + Send + Sync>>,
    pub json_asserts: Vec<Box<dyn Fn(&Value) + Send + Sync>>,
    pub save_as: Option<&'static str>,
}

impl Action {
    pub fn new(name: &'static str, method: &'static str, path: &str) -> Self {
        Self {
            name,
            method,
            path: path.to_string(),
            dyn_path: None,
            body: None,
            dyn_body: None,
            expect: StatusCode::OK,
            query_params: vec![],
            body_asserts: vec![],
            json_asserts: vec![],
            save_as: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_expect(mut self, expect: StatusCode) -> Self {
        self.expect = expect;
        self
    }

    pub fn with_param(mut self, key: &str, val: &str) -> Self {
        self.query_params
            .push((String::from(key), String::from(val)));
        self
    }

    pub fn with_dyn_path<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> String + Send + Sync + 'static,
    {
        self.dyn_path = Some(Box::new(f));
        self
    }

    #[allow(unused)]
    pub fn with_dyn_body<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> Value + Send + Sync + 'static,
    {
        self.dyn_body = Some(Box::new(f));
        self
    }

    pub fn with_save_as(mut self, key: &'static str) -> Self {
        self.save_as = Some(key);
        self
    }

    pub fn assert_body<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.body_asserts.push(Box::new(check));
        self
    }

    pub fn assert_json<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.json_asserts.push(Box::new(check));
        self
    }
}

pub struct Flow {
    actions: Vec<Action>,
}

impl Flow {
    pub fn new() -> Self {
        Self { actions: vec![] }
    }

    pub fn step(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub async fn run(self, server: &mut TestServer) {
        let mut ctx = FlowContext::new(); // create new context for this flow
        for action in self.actions {
            println!("==> Running test action `{}`", action.name);

            let path = if let Some(dyn_path_fn) = action.dyn_path {
                dyn_path_fn(&ctx)
            } else {
                action.path.clone()
            };

            let mut req = match action.method {
                "GET" => server.get(&path),
                "POST" => server.post(&path),
                "PUT" => server.put(&path),
                "DELETE" => server.delete(&path),
                _ => panic!("unsupported method {}", action.method),
            };

            match (action.dyn_body, action.body) {
                (Some(f), _) => {
                    req = req.json(&f(&ctx));
                }
                (_, Some(json)) => req = req.json(&json),
                _ => {}
            }

            if !action.query_params.is_empty() {
                for (k, v) in action.query_params {
                    req = req.add_query_param(&k, v);
                }
            }

            let resp = req.await;
            resp.assert_status(action.expect);

            if !action.body_asserts.is_empty() {
                let body = resp.json::<Value>();
                let body = serde_json::to_string(&body)
                    .unwrap_or_else(|_| panic!("Unable to serialize body to string"));
                for check in action.body_asserts {
                    check(&body);
                }
            }

            if !action.json_asserts.is_empty() {
                let body = resp.json::<Value>();
                for check in action.json_asserts {
                    check(&body);
                }
            }

            if let Some(save_key) = action.save_as {
                let body = resp.json::<Value>();
                ctx.store(save_key, body);
            }
        }
    }
}

// Common action builders

pub fn complete_action(course_id: Uuid, order: i32, selected: Option<i32>) -> Action {
    Action::new(
        "complete_slide",
        "POST",
        &format!("/api/v1/courses/{course_id}/slides/{order}/complete"),
    )
    .with_body(serde_json::json!({ "selected_option_index": selected }))
}

pub fn outline_action(course_id: Uuid) -> Action {
    Action::new(
        "outline",
        "GET",
        &format!("/api/v1/courses/{course_id}/slides"),
    )
}

pub fn exam_start_action(course_id: Uuid) -> Action {
    Action::new(
        "exam_start",
        "POST",
        &format!("/api/v1/courses/{course_id}/exam/session"),
    )
    .with_expect(StatusCode::CREATED)
}

pub fn exam_answer_action(selected: Option<usize>) -> Action {
    Action::new("exam_answer", "POST", "dynamic")
        .with_dyn_path(|ctx| {
            let session_id = ctx.get("session")["session_id"]
                .as_str()
                .expect("session_id missing")
                .to_string();
            format!("/api/v1/exam/sessions/{session_id}/answer")
        })
        .with_body(serde_json::json!({ "selected_option_index": selected }))
}
