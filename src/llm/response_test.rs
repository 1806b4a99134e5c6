#[cfg(test)]
mod tests {
    use crate::llm::types::{CompletionResponse, ErrorBody, Role};

    #[test]
    fn test_parse_deepseek_response() {
        let json_response = r#"{
            "id": "930c60df-bf64-41c9-a88e-3ec75f81e00e",
            "object": "chat.completion",
            "created": 1705651092,
            "model": "deepseek-chat",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "```json\n{\"questions\": []}\n```"
                    },
                    "logprobs": null,
                    "finish_reason": "stop"
                }
            ],
            "usage": {
                "prompt_tokens": 16,
                "completion_tokens": 10,
                "total_tokens": 26
            }
        }"#;

        let response: Result<CompletionResponse, _> = serde_json::from_str(json_response);
        assert!(response.is_ok());

        let response = response.unwrap();
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].message.role, Role::Assistant);
        assert!(response.first_content().unwrap().contains("questions"));
    }

    #[test]
    fn test_reject_unknown_shape() {
        let response: Result<CompletionResponse, _> =
            serde_json::from_str(r#"{"result": "no choices here"}"#);
        assert!(response.is_err());

        let response: Result<CompletionResponse, _> =
            serde_json::from_str(r#"{"choices": [{"text": "legacy completion"}]}"#);
        assert!(response.is_err());
    }

    #[test]
    fn test_error_body_status_is_optional() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"Missing API Key","message":"API Key is required"}"#)
                .unwrap();
        assert_eq!(body.status, None);

        let encoded = serde_json::to_value(&body).unwrap();
        assert!(encoded.get("status").is_none());
    }
}
