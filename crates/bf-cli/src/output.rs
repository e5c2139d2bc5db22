use serde::Serialize;

pub(crate) fn json_text<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

pub(crate) fn emit_ok() {
    println!("RESULT:OK");
}

pub(crate) fn emit_json<T: Serialize + ?Sized>(key: &str, value: &T) {
    println!("{}_JSON:{}", key, json_text(value));
}

pub(crate) fn emit_names(names: &[String]) {
    emit_ok();
    for name in names {
        emit_json("NAME", name);
    }
}
