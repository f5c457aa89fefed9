// src/provider/offline.rs - Canned answers, no network
//
// Reads the subject and the student's question back out of the composed
// prompt and picks a subject-specific stock reply. The same prompt always gets
// the same reply.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{AnswerProvider, ImageInput};
use crate::infra::errors::TutorError;

const GREETINGS: &[&str] = &[
    "Xin chào! Mình là trợ lý học tập. Bạn cần giúp gì hôm nay?",
    "Chào bạn! Mình có thể giúp bạn làm bài tập và trả lời câu hỏi về bài học.",
    "Xin chào! Hãy gửi câu hỏi hoặc ảnh bài tập, mình sẽ hỗ trợ ngay.",
];

const AI_OVERVIEW: &str = "\
Có thể phân loại trí tuệ nhân tạo theo nhiều cách:

Theo mức độ phát triển:
1. Trí tuệ nhân tạo hẹp: chỉ giỏi một việc cụ thể
2. Trí tuệ nhân tạo tổng quát: làm được nhiều việc như con người
3. Siêu trí tuệ nhân tạo: vượt qua con người (hiện chỉ là giả thuyết)

Theo phương pháp học:
1. Học máy
2. Học sâu
3. Học tăng cường

Theo ứng dụng: thị giác máy tính, xử lý ngôn ngữ tự nhiên, người máy, hệ chuyên gia, nhận dạng giọng nói.";

const FALLBACK_SUBJECT: &str = "Toán học";

fn canned_answers(subject: &str) -> Option<&'static [&'static str]> {
    let answers: &'static [&'static str] = match subject {
        "Toán học" => &[
            "Để giải bài toán này, trước hết hãy xác định dữ kiện đã cho và điều cần tìm, rồi chọn công thức phù hợp.",
            "Đây là bài toán hình học. Hãy vẽ hình, ghi các kích thước đã biết, sau đó áp dụng công thức tính diện tích hoặc chu vi.",
            "Bài tập này thuộc phần đại số. Hãy chuyển các số hạng chứa ẩn về một vế và rút gọn.",
        ],
        "Ngữ văn" => &[
            "Khi phân tích tác phẩm, hãy chú ý hoàn cảnh sáng tác, nhân vật chính và các biện pháp tu từ.",
            "Đoạn văn này nổi bật nhờ cách dùng hình ảnh so sánh và nhân hóa để bộc lộ cảm xúc.",
        ],
        "Tiếng Anh" => &[
            "Cấu trúc ngữ pháp này dùng để diễn tả một hành động đã hoàn thành trước một thời điểm trong quá khứ.",
            "Đây là cụm động từ; nghĩa của nó thường khác với nghĩa của từng từ riêng lẻ.",
        ],
        "Vật lý" => &[
            "Hiện tượng này được giải thích bằng định luật bảo toàn năng lượng.",
            "Để tính lực tác dụng, hãy xác định khối lượng và gia tốc rồi áp dụng định luật II Niu-tơn.",
        ],
        "Hóa học" => &[
            "Đây là phản ứng oxi hóa - khử. Hãy xác định chất nhường và chất nhận electron.",
            "Để cân bằng phương trình, hãy đếm số nguyên tử từng nguyên tố ở hai vế rồi thêm hệ số thích hợp.",
        ],
        "Sinh học" => &[
            "Quá trình này diễn ra trong ti thể, nơi tế bào tạo ra năng lượng.",
            "Tế bào gồm ba thành phần chính: màng sinh chất, chất tế bào và nhân.",
        ],
        "Lịch sử" => &[
            "Sự kiện này cần được đặt trong bối cảnh thời kỳ lịch sử cụ thể để hiểu nguyên nhân và ý nghĩa.",
            "Nhân vật lịch sử này có đóng góp quan trọng trong công cuộc bảo vệ đất nước.",
        ],
        "Địa lý" => &[
            "Khí hậu của vùng này chịu ảnh hưởng của gió mùa và địa hình.",
            "Dân cư ở khu vực này sinh sống chủ yếu nhờ nông nghiệp và đánh bắt thủy sản.",
        ],
        "Công nghệ" => &[
            "Quy trình này gồm các bước: chuẩn bị vật liệu, gia công, lắp ráp và kiểm tra.",
            "Thiết bị này hoạt động dựa trên nguyên lý biến đổi điện năng thành cơ năng.",
        ],
        "Giáo dục công dân" => &[
            "Quyền và nghĩa vụ cơ bản của công dân được quy định trong Hiến pháp.",
            "Khi gặp tình huống này, hãy cư xử dựa trên pháp luật và chuẩn mực đạo đức.",
        ],
        "Tin học" => &[
            "Thuật toán này duyệt qua từng phần tử một lần, nên thời gian chạy tăng tuyến tính theo số phần tử.",
            "Khi viết chương trình, hãy chú ý các cấu trúc rẽ nhánh và vòng lặp.",
        ],
        _ => return None,
    };
    Some(answers)
}

/// Value of a `Label: value` line in the prompt.
fn prompt_field<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .map(str::trim)
}

/// The student's question: everything after the question header, up to the image line.
fn question_of(prompt: &str) -> &str {
    let Some((_, rest)) = prompt.split_once("Câu hỏi của học sinh:\n") else {
        return prompt.trim();
    };
    rest.split("\nHình ảnh đính kèm:").next().unwrap_or(rest).trim()
}

fn pick<'a>(options: &[&'a str], seed: &str) -> &'a str {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    options[(hasher.finish() % options.len() as u64) as usize]
}

#[derive(Debug, Default)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn answer(&self, prompt: &str) -> String {
        let question = question_of(prompt);
        let lowered = question.to_lowercase();

        if ["loại ai", "phân loại ai", "các loại trí tuệ nhân tạo"]
            .iter()
            .any(|k| lowered.contains(k))
        {
            return AI_OVERVIEW.to_string();
        }

        let is_greeting = question.chars().count() < 10
            && ["chào", "hi", "hello"].iter().any(|w| lowered.contains(w));
        if is_greeting {
            return pick(GREETINGS, question).to_string();
        }

        let subject = prompt_field(prompt, "Môn học:").unwrap_or(FALLBACK_SUBJECT);
        let answers = canned_answers(subject)
            .or_else(|| canned_answers(FALLBACK_SUBJECT))
            .unwrap_or(GREETINGS);
        pick(answers, question).to_string()
    }
}

#[async_trait]
impl AnswerProvider for OfflineProvider {
    fn id(&self) -> &str {
        "offline"
    }

    async fn dispatch(
        &self,
        prompt: &str,
        _api_key: Option<&str>,
        _image: Option<ImageInput>,
    ) -> Result<String, TutorError> {
        tracing::debug!("Answering offline ({} chars of prompt)", prompt.len());
        Ok(self.answer(prompt))
    }
}
