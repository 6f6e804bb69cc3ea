//! User-facing replies (Azerbaijani).

pub const WELCOME: &str = "👋 Salam! Bu bot aktivlərinizi qeyd etmək üçün istifadə olunur. 📦\n\n\
📝 Məlumat gedişatı:\n\
1️⃣ Barkodun şəklini göndərin (barkod tanınmasa, OCR tətbiq ediləcək).\n\
2️⃣ Bot barkodu (və ya AZT kodunu) göstərir.\n\
3️⃣ Sizin göndərəcəyiniz aktivin adı ✍️\n\
4️⃣ Miqdar 🔢\n\
✅ Sonda Google Sheets-də saxlanılır.\n\n\
Birdən çox mal əlavə etmək üçün hər barkod üçün şəkil göndərməyə davam edin. /done yazaraq bitirə bilərsiniz.\n\
Hər hansı köməyə ehtiyac olarsa /help yazın.\n\
Prosesi ləğv etmək üçün /cancel yazın.\n\n\
İlk olaraq barkodun şəklini göndərin. ✅";

pub const HELP: &str = "ℹ️ Kömək:\n\
- /start: Yeni prosesə başlayır.\n\
- /done: Bütün məhsulları əlavə etməyi bitirir.\n\
- /cancel: Mövcud əməliyyatı ləğv edir.\n\
- Barkod şəkli göndərin -> Bot oxumağa çalışacaq.\n\
- Barkod oxunmazsa, bot OCR ilə 'AZT...' axtaracaq və ya əl ilə barkod daxil edə bilərsiniz.\n\
- Sonra aktivin adını və miqdarını daxil edirsiniz.\n\
- Məlumat Google Sheets-ə yazılır.\n\
Qeyd: Sualınız varsa, burada botu yoxlayın və ya komanda rəhbərinizlə əlaqə saxlayın.";

pub const CANCELLED: &str = "Əməliyyat ləğv edildi. Yeni proses üçün /start yazın.";

pub const FINISHED: &str =
    "Bütün barkodlar əlavə olundu. Təşəkkürlər! Yeni proses üçün /start yazın.";

pub const NEED_START: &str = "Prosesə başlamaq üçün /start yazın.";

pub const PHOTO_NOT_EXPECTED: &str =
    "Hazırda fotoya ehtiyac yoxdur. Zəhmət olmasa addımları izləyin.";

pub const BARCODE_NOT_FOUND: &str = "⚠ Barkod/QR tapılmadı. Daha yaxın/gözəl şəkil çəkin,\n\
yaxud /cancel yazaraq ləğv edin,\n\
və ya əl ilə barkod daxil etmək üçün /manual yazın.";

pub const MANUAL_NOT_ALLOWED: &str = "Bu mərhələdə əl ilə barkod daxil etməyə icazə verilmir.";

pub const MANUAL_PROMPT: &str = "ℹ️ Barkodu əl ilə daxil edin (məsələn: AZT10013025).";

pub const EXPECTING_PHOTO: &str =
    "Zəhmət olmasa barkodun şəklini göndərin və ya /manual yazın.";

pub const ASK_QUANTITY: &str = "🔢 İndi miqdarı daxil edin (rəqəm).";

pub const INVALID_QUANTITY: &str = "❌ Xəta! Zəhmət olmasa miqdarı rəqəm kimi daxil edin.";

pub const SAVE_FAILED: &str =
    "❌ Məlumatı saxlayarkən problem yarandı. Xahiş edirəm yenidən cəhd edin.";

/// Placeholder written when the barcode is unknown.
pub const NO_BARCODE: &str = "(Barkod yoxdur)";

/// Placeholder written when the asset name is unknown.
pub const NO_DESCRIPTION: &str = "(Ad yoxdur)";

pub fn barcode_detected(barcode: &str) -> String {
    format!("✅ Barkod aşkarlandı: {barcode}\nİndi aktivin adını yazın.")
}

pub fn manual_barcode_accepted(barcode: &str) -> String {
    format!("Əl ilə barkod götürüldü: {barcode}\nİndi aktivin adını yazın.")
}

pub fn item_saved(barcode: &str, description: &str, quantity: i64) -> String {
    format!(
        "✅ Məlumat qeydə alındı:\nBarkod: {barcode}\nAd: {description}\nMiqdar: {quantity}\n\
         Yeni barkod üçün yenidən şəkil göndərin və ya /done yazın bitirmək üçün."
    )
}
