//! Subject and evaluator servers talking over real sockets.

use std::sync::Arc;

use axum::Router;
use personagym_core::{
    evaluator_router, subject_router, AgentCard, EvalRequest, EvalResponse, EvaluationConfig,
    Evaluator, LlmQuestionGenerator, LlmScorer, Persona, SubjectAgent, TaskCategory,
};
use personagym_llm::fakes::ScriptedGenerator;
use personagym_llm::CompletionRequest;

const PERSONA: &str = "A polite and professional customer service agent.";

async fn bind(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

/// Model that answers politely, always ending with a courtesy line.
fn polite_model() -> ScriptedGenerator {
    ScriptedGenerator::from_fn(|request: &CompletionRequest| {
        Ok(format!(
            "Thank you for your question about \"{}\". I'm happy to help you with that. \
             Is there anything else I can do for you today?",
            request.user
        ))
    })
}

#[tokio::test]
async fn test_full_evaluation_over_http() {
    let persona = Persona::new(PERSONA).unwrap();
    let subject_model = Arc::new(polite_model());
    let subject = bind(subject_router(
        Arc::new(SubjectAgent::new(persona.clone(), subject_model.clone())),
        AgentCard::subject("http://127.0.0.1:8001", &persona),
    ))
    .await;

    let question_model = Arc::new(ScriptedGenerator::constant(
        r#"```json
["How would you greet an upset customer?",
 "What would you never say to a customer?",
 "A customer asks for a refund outside policy. What do you do?",
 "Describe your ideal working day."]
```"#,
    ));
    let judge = Arc::new(ScriptedGenerator::constant(
        r#"{"score": 4.5, "rationale": "Courteous and on persona."}"#,
    ));
    let evaluator = Evaluator::new(
        Arc::new(LlmQuestionGenerator::new(question_model.clone())),
        Arc::new(LlmScorer::new(judge.clone())),
    );
    let green = bind(evaluator_router(
        Arc::new(evaluator),
        AgentCard::evaluator("http://127.0.0.1:9009"),
    ))
    .await;

    let request = EvalRequest::new(&subject, EvaluationConfig::new(4, "general").unwrap());
    let response = reqwest::Client::new()
        .post(format!("{}/evaluate", green))
        .json(&request)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: EvalResponse = response.json().await.unwrap();
    let report = body.response;

    assert_eq!(report.persona, PERSONA);
    assert_eq!(report.num_questions, 4);
    assert_eq!(report.entries.len(), 4);
    assert_eq!(question_model.call_count(), 1);
    assert_eq!(subject_model.call_count(), 4);
    assert_eq!(judge.call_count(), 4);

    for (i, entry) in report.entries.iter().enumerate() {
        assert_eq!(entry.task_category, TaskCategory::for_index(i));
        assert!(entry.answer.contains(&entry.question));
        assert_eq!(entry.score, 4.5);
    }
    assert!((report.overall_score - 4.5).abs() < 1e-9);
    assert_eq!(report.per_task_scores.len(), 4);
    assert!(body.summary.contains("Overall Score: 4.50/5.0"));

    // Every answer was generated under the persona's system prompt.
    for request in subject_model.requests() {
        assert!(request.system.as_deref().unwrap().contains(PERSONA));
    }
}
