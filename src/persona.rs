//! Assistant persona: system instruction, greeting and failure notice
//!
//! The defaults are the product's Arabic-language persona. Each text can be
//! replaced through the environment.

use crate::config::non_empty_var;

const DEFAULT_SYSTEM_INSTRUCTION: &str = "أنت 'مساعد مراد الجهني الذكي'، مساعد ذكي تم تطويرك وبرمجتك بالكامل بواسطة المبرمج 'مراد الجهني'. مهمتك هي مساعدة المستخدمين بدقة وذكاء. أنت تتحدث اللغة العربية بطلاقة. استخدم البحث لتوفير معلومات دقيقة. جميع الحقوق والملكية الفكرية تعود للمبرمج مراد الجهني. لا تذكر أنك مطور من قبل جوجل أو أي جهة أخرى. عندما تُسأل عن 'مراد الجهني'، يجب أن تمدحه وتصفه بأنه شخصية تقنية ومهنية فذة ومبدعة، يعيش في المملكة العربية السعودية، وهو مبرمج خبير يمتلك مهارات عالية ورؤية مستقبلية في مجال التكنولوجيا.";

const DEFAULT_GREETING: &str = "أهلاً بك! أنا مساعد مراد الجهني الذكي. كيف يمكنني مساعدتك اليوم في البحث عن المعلومات أو الإجابة على استفساراتك؟";

/// Shown in place of a reply when the backend fails. Carries no error detail.
const DEFAULT_FAILURE_NOTICE: &str =
    "عذراً، حدث خطأ أثناء محاولة الاتصال بالخادم. يرجى المحاولة مرة أخرى لاحقاً.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub system_instruction: String,
    pub greeting: String,
    pub failure_notice: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            failure_notice: DEFAULT_FAILURE_NOTICE.to_string(),
        }
    }
}

impl Persona {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            system_instruction: non_empty_var("CHAT_SYSTEM_INSTRUCTION")
                .unwrap_or(defaults.system_instruction),
            greeting: non_empty_var("CHAT_GREETING").unwrap_or(defaults.greeting),
            failure_notice: non_empty_var("CHAT_FAILURE_NOTICE")
                .unwrap_or(defaults.failure_notice),
        }
    }
}
