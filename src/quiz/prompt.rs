use serde_json::{json, Value};

use super::types::{Difficulty, QuestionKind, QuizConfig};

/// System and user messages for one quiz request
#[derive(Debug, Clone, PartialEq)]
pub struct QuizPrompt {
    pub system: String,
    pub user: String,
}

/// JSON schema of one question, embedded verbatim in the system prompt
pub fn question_schema() -> Value {
    let string_list = json!({ "type": "array", "items": { "type": "string" } });

    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "type": { "type": "string", "enum": ["TN", "TLN", "DS"] },
            "difficulty": { "type": "string", "enum": ["BIET", "HIEU", "VANDUNG"] },
            "questionText": {
                "type": "string",
                "description": "Nội dung câu hỏi, công thức LaTeX trong $...$, không dùng HTML"
            },
            "options": string_list,
            "correctAnswer": { "type": "string", "description": "TN: 'A'..'D'. TLN: một số." },
            "explanation": { "type": "string", "description": "Lời giải chi tiết, xuống dòng bằng '\\n'" },
            "statements": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "content": { "type": "string" },
                        "isCorrect": { "type": "boolean" }
                    },
                    "required": ["id", "content", "isCorrect"]
                }
            },
            "variationTableData": {
                "type": "object",
                "nullable": true,
                "properties": {
                    "xNodes": string_list,
                    "yPrimeSigns": string_list,
                    "yPrimeVals": string_list,
                    "yNodes": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Tại tiệm cận đứng dùng dạng 'Trái||Phải'"
                    }
                }
            },
            "graphFunction": { "type": "string", "nullable": true },
            "asymptotes": string_list,
            "geometryGraph": {
                "type": "object",
                "nullable": true,
                "properties": {
                    "nodes": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "x": { "type": "number" },
                                "y": { "type": "number" },
                                "z": { "type": "number" },
                                "labelPosition": { "type": "string", "nullable": true }
                            },
                            "required": ["id", "x", "y", "z"]
                        }
                    },
                    "edges": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "from": { "type": "string" },
                                "to": { "type": "string" },
                                "style": { "type": "string", "enum": ["SOLID", "DASHED"] }
                            },
                            "required": ["from", "to", "style"]
                        }
                    }
                }
            },
            "plotlyData": {
                "type": "object",
                "nullable": true,
                "properties": {
                    "data": { "type": "array", "items": { "type": "object" } },
                    "layout": { "type": "object" }
                }
            }
        },
        "required": ["id", "type", "questionText", "explanation"]
    })
}

/// Build the quiz generation prompt
pub fn build_quiz_prompt(config: &QuizConfig) -> QuizPrompt {
    let total = config.distribution.total().unwrap_or(u32::MAX);
    let schema = serde_json::to_string_pretty(&question_schema()).unwrap_or_default();

    let mut distribution = String::new();
    for kind in QuestionKind::ALL {
        let counts = config.distribution.for_kind(kind);
        distribution.push_str(&format!(
            "- {} ({}): {} câu\n",
            kind.label(),
            kind.code(),
            counts.total().unwrap_or(u32::MAX)
        ));
        for level in Difficulty::ALL {
            distribution.push_str(&format!("  + Mức {}: {}\n", level.label(), counts.get(level)));
        }
    }

    let extra = config
        .additional_prompt
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Không có");

    let system = format!(
        "Bạn là chuyên gia giáo dục chuyên soạn đề thi Toán.\n\
         Hãy tạo {total} câu hỏi về chủ đề \"{topic}\" theo phân phối và yêu cầu dưới đây.\n\n\
         Chỉ trả về JSON hợp lệ đúng schema, không kèm lời giải thích bên ngoài JSON.\n\n\
         SCHEMA CỦA MỘT CÂU HỎI:\n{schema}\n\n\
         PHÂN PHỐI CÂU HỎI:\n{distribution}\n\
         YÊU CẦU BỔ SUNG: {extra}\n\n\
         QUY TẮC:\n\
         1. Mỗi câu có id duy nhất (\"q1\", \"q2\", ...)\n\
         2. Công thức toán viết bằng LaTeX trong $...$\n\
         3. Hình học không gian: dùng geometryGraph, cạnh khuất có style DASHED\n\
         4. Câu về hàm số chỉ dùng MỘT cách cho hàm: công thức, đồ thị hoặc bảng biến thiên\n\
         5. Tiệm cận ghi trong mảng asymptotes, ví dụ [\"x=2\", \"y=1\"]\n\
         6. Bảng biến thiên ghi trong variationTableData\n\
         7. Câu Đúng/Sai có đúng 4 statements với isCorrect true/false",
        topic = config.topic,
    );

    let user = format!(
        "Tạo chính xác {total} câu hỏi về \"{topic}\" theo phân phối và yêu cầu trên.\n\
         Mỗi câu phải đúng mức độ đã yêu cầu.\n\
         Trả về JSON chứa mảng các câu hỏi.",
        topic = config.topic,
    );

    QuizPrompt { system, user }
}

/// Build the theory summary prompt for a topic
pub fn build_theory_prompt(topic: &str) -> String {
    format!(
        "Bạn là giáo viên Toán THPT. Hãy tóm tắt LÝ THUYẾT TRỌNG TÂM của chủ đề \"{topic}\".\n\n\
         YÊU CẦU:\n\
         1. Ngắn gọn, tập trung vào định nghĩa, công thức và tính chất quan trọng nhất\n\
         2. Trình bày bằng Markdown với các heading (#, ##, ###)\n\
         3. Mọi công thức viết bằng LaTeX trong dấu $, ví dụ $\\int_a^b f(x)\\,dx$\n\
         4. Chia mục: I. Định nghĩa, II. Công thức, III. Tính chất, IV. Ví dụ minh họa\n\
         5. Chỉ trả về nội dung lý thuyết\n\
         6. Dùng tiếng Việt với thuật ngữ Toán học chuẩn\n\n\
         Nhấn mạnh những phần học sinh hay quên hoặc nhầm lẫn."
    )
}
