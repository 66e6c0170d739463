// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_prose(size: usize) -> String {
    let base = "# 章\n\n「おはよう」と太郎は言った。|東京《とうきょう》の朝は早い。\n\n## 節\n\n彼女は―そう、あの花子は―返事をしなかった。今日も都庁の前を通って学校へ向かう。\n\n```\n下書きのメモ\n```\n\n";
    base.repeat(size)
}
